//! Turns engine execution results into domain [`Event`]s.

use crate::error::VmError;
use crate::gas::{ChargeGas, GasMeter};
use crate::protocol::{AbortLocation, ExecuteResponse, LcsType, ModuleIdent, TypeTag, VmEvent};
use mvm_types::address::stringify_sender_address;
use mvm_types::{Event, EventAttribute};

/// Base cost of rendering one type level past the free levels.
pub const EVENT_TYPE_PROCESSING_GAS: u64 = 10_000;
/// Nesting levels rendered without charge.
pub const EVENT_TYPE_NO_GAS_LEVELS: u64 = 2;

pub const EVENT_TYPE_CONTRACT_STATUS: &str = "contract_status";
pub const EVENT_TYPE_MOVE_EVENT: &str = "contract_events";

pub const ATTRIBUTE_STATUS: &str = "status";
pub const ATTRIBUTE_MAJOR_STATUS: &str = "major_status";
pub const ATTRIBUTE_SUB_STATUS: &str = "sub_status";
pub const ATTRIBUTE_MESSAGE: &str = "message";
pub const ATTRIBUTE_LOCATION_ADDRESS: &str = "location_address";
pub const ATTRIBUTE_LOCATION_MODULE: &str = "location_module";
pub const ATTRIBUTE_SENDER_ADDRESS: &str = "sender_address";
pub const ATTRIBUTE_SOURCE: &str = "source";
pub const ATTRIBUTE_TYPE: &str = "type";
pub const ATTRIBUTE_DATA: &str = "data";

pub const STATUS_KEEP: &str = "keep";
pub const STATUS_DISCARD: &str = "discard";
pub const SOURCE_SCRIPT: &str = "script";

const GAS_DESCRIPTOR: &str = "event type processing";

/// Status event describing how an execution ended.
pub fn contract_status_events(response: &ExecuteResponse) -> Vec<Event> {
    if response.status.is_success() {
        return vec![Event::new(
            EVENT_TYPE_CONTRACT_STATUS,
            vec![EventAttribute::new(ATTRIBUTE_STATUS, STATUS_KEEP)],
        )];
    }

    let (major, sub, location) = response.status.codes();
    let mut attributes = Vec::with_capacity(6);
    attributes.push(EventAttribute::new(ATTRIBUTE_STATUS, STATUS_DISCARD));
    if let Some(AbortLocation { address, module }) = location {
        if !address.is_empty() {
            attributes.push(EventAttribute::new(
                ATTRIBUTE_LOCATION_ADDRESS,
                stringify_sender_address(address),
            ));
        }
        if !module.is_empty() {
            attributes.push(EventAttribute::new(ATTRIBUTE_LOCATION_MODULE, module.clone()));
        }
    }
    attributes.push(EventAttribute::new(ATTRIBUTE_MAJOR_STATUS, major.to_string()));
    attributes.push(EventAttribute::new(ATTRIBUTE_SUB_STATUS, sub.to_string()));
    if let Some(message) = &response.message {
        attributes.push(EventAttribute::new(ATTRIBUTE_MESSAGE, message.clone()));
    }

    vec![Event::new(EVENT_TYPE_CONTRACT_STATUS, attributes)]
}

/// `script` for script events, `addr::module` for module events.
pub fn event_source(sender_module: Option<&ModuleIdent>) -> String {
    match sender_module {
        None => SOURCE_SCRIPT.to_string(),
        Some(module) => format!(
            "{}::{}",
            stringify_sender_address(&module.address),
            module.name
        ),
    }
}

/// Renders a type descriptor as one-line Move syntax, charging `meter`
/// for every level past [`EVENT_TYPE_NO_GAS_LEVELS`].
pub fn stringify_event_type<M>(meter: &mut M, tag: Option<&TypeTag>) -> Result<String, VmError>
where
    M: ChargeGas + ?Sized,
{
    process_event_type(meter, tag, EVENT_TYPE_PROCESSING_GAS, 1).map_err(|e| {
        VmError::EventType {
            tag: format!("{:?}", tag),
            source: Box::new(e),
        }
    })
}

fn process_event_type<M>(
    meter: &mut M,
    tag: Option<&TypeTag>,
    mut gas: u64,
    depth: u64,
) -> Result<String, VmError>
where
    M: ChargeGas + ?Sized,
{
    // Charge before looking at children.
    if depth > EVENT_TYPE_NO_GAS_LEVELS {
        let step = EVENT_TYPE_PROCESSING_GAS.saturating_mul(depth - EVENT_TYPE_NO_GAS_LEVELS - 1);
        gas = gas.saturating_add(step);
        meter.charge_gas(gas, GAS_DESCRIPTOR)?;
    }

    let Some(tag) = tag else {
        return Ok(String::new());
    };

    if tag.type_tag == LcsType::Vector && tag.vector_type.is_none() {
        return Err(VmError::MalformedTypeTag(
            "TypeTag of type \"vector\", but VectorType is nil".to_string(),
        ));
    }
    if tag.type_tag == LcsType::Struct && tag.struct_ident.is_none() {
        return Err(VmError::MalformedTypeTag(
            "TypeTag of type \"struct\", but StructIdent is nil".to_string(),
        ));
    }

    if let Some(inner) = &tag.vector_type {
        let inner = process_event_type(meter, Some(inner), gas, depth + 1)?;
        return Ok(format!("vector<{}>", inner));
    }

    if let Some(ident) = &tag.struct_ident {
        let struct_type = format!(
            "{}::{}::{}",
            stringify_sender_address(&ident.address),
            ident.module,
            ident.name
        );
        if ident.type_params.is_empty() {
            return Ok(struct_type);
        }

        let mut params = Vec::with_capacity(ident.type_params.len());
        for param in &ident.type_params {
            params.push(process_event_type(meter, Some(param), gas, depth + 1)?);
        }
        return Ok(format!("{}<{}>", struct_type, params.join(", ")));
    }

    Ok(tag.type_tag.as_move_str().to_string())
}

/// Converts one engine event into a `contract_events` event.
pub fn move_event<M>(meter: &mut M, event: &VmEvent) -> Result<Event, VmError>
where
    M: ChargeGas + ?Sized,
{
    let event_type = stringify_event_type(meter, event.event_type.as_ref())?;
    Ok(Event::new(
        EVENT_TYPE_MOVE_EVENT,
        vec![
            EventAttribute::new(
                ATTRIBUTE_SENDER_ADDRESS,
                stringify_sender_address(&event.sender_address),
            ),
            EventAttribute::new(ATTRIBUTE_SOURCE, event_source(event.sender_module.as_ref())),
            EventAttribute::new(ATTRIBUTE_TYPE, event_type),
            EventAttribute::new(ATTRIBUTE_DATA, hex::encode(&event.event_data)),
        ],
    ))
}

/// Status event followed by every engine event, rendered under an
/// unlimited meter.
pub fn build_events(response: &ExecuteResponse) -> Result<Vec<Event>, VmError> {
    let mut events = contract_status_events(response);
    let mut meter = GasMeter::unlimited();
    for vm_event in &response.events {
        events.push(move_event(&mut meter, vm_event)?);
    }
    Ok(events)
}
