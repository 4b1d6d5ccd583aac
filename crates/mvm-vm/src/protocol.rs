//! Wire types exchanged with the execution engine.

use mvm_types::{AccessPath, Address, ScriptArg, VmTypeTag};
use serde::{Deserialize, Serialize};

/// Move `EXECUTED` status code.
pub const VM_EXECUTED_CODE: u64 = 4001;
/// Move `ABORTED` status code, reported as the major status of aborts.
pub const VM_ABORTED_CODE: u64 = 4016;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleIdent {
    #[serde(with = "hex")]
    pub address: Vec<u8>,
    pub name: String,
}

/// Where an execution aborted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortLocation {
    #[serde(with = "hex", default)]
    pub address: Vec<u8>,
    #[serde(default)]
    pub module: String,
}

/// Outcome reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Abort {
        code: u64,
        location: Option<AbortLocation>,
    },
    ExecutionFailure {
        status_code: u64,
        location: Option<AbortLocation>,
    },
    MoveError {
        status_code: u64,
    },
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }

    /// `(major, sub, location)` status codes.
    pub fn codes(&self) -> (u64, u64, Option<&AbortLocation>) {
        match self {
            ExecutionStatus::Success => (VM_EXECUTED_CODE, 0, None),
            ExecutionStatus::Abort { code, location } => {
                (VM_ABORTED_CODE, *code, location.as_ref())
            }
            ExecutionStatus::ExecutionFailure {
                status_code,
                location,
            } => (*status_code, 0, location.as_ref()),
            ExecutionStatus::MoveError { status_code } => (*status_code, 0, None),
        }
    }
}

/// Write-set operation kind. Kinds this node does not know decode as `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    Value,
    Deletion,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSetValue {
    pub op: WriteOp,
    pub path: AccessPath,
    #[serde(with = "hex", default)]
    pub value: Vec<u8>,
}

impl WriteSetValue {
    pub fn set(path: AccessPath, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op: WriteOp::Value,
            path,
            value: value.into(),
        }
    }

    pub fn delete(path: AccessPath) -> Self {
        Self {
            op: WriteOp::Deletion,
            path,
            value: Vec::new(),
        }
    }
}

/// Move type kinds appearing in event type descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LcsType {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector,
    Struct,
    #[serde(other)]
    Unknown,
}

impl LcsType {
    /// Move source spelling.
    pub fn as_move_str(&self) -> &'static str {
        match self {
            LcsType::Bool => "bool",
            LcsType::U8 => "u8",
            LcsType::U64 => "u64",
            LcsType::U128 => "u128",
            LcsType::Address => "address",
            LcsType::Signer => "signer",
            LcsType::Vector => "vector",
            LcsType::Struct => "struct",
            LcsType::Unknown => "unknown",
        }
    }
}

/// Recursive Move type descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTag {
    pub type_tag: LcsType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_type: Option<Box<TypeTag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_ident: Option<StructIdent>,
}

impl TypeTag {
    pub fn primitive(type_tag: LcsType) -> Self {
        Self {
            type_tag,
            vector_type: None,
            struct_ident: None,
        }
    }

    pub fn vector(inner: TypeTag) -> Self {
        Self {
            type_tag: LcsType::Vector,
            vector_type: Some(Box::new(inner)),
            struct_ident: None,
        }
    }

    pub fn structure(ident: StructIdent) -> Self {
        Self {
            type_tag: LcsType::Struct,
            vector_type: None,
            struct_ident: Some(ident),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructIdent {
    #[serde(with = "hex")]
    pub address: Vec<u8>,
    pub module: String,
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeTag>,
}

/// Event emitted by Move code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmEvent {
    #[serde(with = "hex")]
    pub sender_address: Vec<u8>,
    #[serde(default)]
    pub sender_module: Option<ModuleIdent>,
    #[serde(default)]
    pub event_type: Option<TypeTag>,
    #[serde(with = "hex", default)]
    pub event_data: Vec<u8>,
}

/// Result of publishing a module or executing a script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub write_set: Vec<WriteSetValue>,
    #[serde(default)]
    pub events: Vec<VmEvent>,
    #[serde(default)]
    pub gas_used: u64,
}

impl ExecuteResponse {
    pub fn success(write_set: Vec<WriteSetValue>, events: Vec<VmEvent>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            message: None,
            write_set,
            events,
            gas_used: 0,
        }
    }

    pub fn failure(status: ExecutionStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            write_set: Vec::new(),
            events: Vec::new(),
            gas_used: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishModuleRequest {
    pub sender: Address,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    #[serde(with = "hex")]
    pub code: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmArg {
    #[serde(rename = "type")]
    pub type_tag: VmTypeTag,
    #[serde(with = "hex")]
    pub value: Vec<u8>,
}

impl From<&ScriptArg> for VmArg {
    fn from(arg: &ScriptArg) -> Self {
        Self {
            type_tag: arg.type_tag(),
            value: arg.encode(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteScriptRequest {
    pub senders: Vec<Address>,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub block: u64,
    pub timestamp: u64,
    #[serde(with = "hex")]
    pub code: Vec<u8>,
    #[serde(default)]
    pub type_params: Vec<TypeTag>,
    #[serde(default)]
    pub args: Vec<VmArg>,
}

/// Request retried by the execution client. Exactly one kind per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecuteRequest {
    PublishModule(PublishModuleRequest),
    ExecuteScript(ExecuteScriptRequest),
}

impl ExecuteRequest {
    /// Builds a request from optional parts; exactly one must be present.
    pub fn from_parts(
        module: Option<PublishModuleRequest>,
        script: Option<ExecuteScriptRequest>,
    ) -> Result<Self, crate::error::VmError> {
        match (module, script) {
            (Some(module), None) => Ok(ExecuteRequest::PublishModule(module)),
            (None, Some(script)) => Ok(ExecuteRequest::ExecuteScript(script)),
            (None, None) => Err(crate::error::VmError::InvalidRequest(
                "request (module / script) not specified".to_string(),
            )),
            (Some(_), Some(_)) => Err(crate::error::VmError::InvalidRequest(
                "only single request (module / script) is supported".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExecuteRequest::PublishModule(_) => "publish_module",
            ExecuteRequest::ExecuteScript(_) => "execute_script",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub text: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFiles {
    pub units: Vec<CompilationUnit>,
    pub address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    pub name: String,
    #[serde(with = "hex")]
    pub bytecode: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationResult {
    #[serde(default)]
    pub units: Vec<CompiledUnit>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bytecode {
    #[serde(with = "hex")]
    pub code: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMeta {
    pub signers_count: u32,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<VmTypeTag>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructMeta {
    pub name: String,
    pub is_resource: bool,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMeta {
    pub name: String,
    pub is_public: bool,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub returns: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMeta {
    pub name: String,
    #[serde(default)]
    pub types: Vec<StructMeta>,
    #[serde(default)]
    pub functions: Vec<FunctionMeta>,
}

/// Bytecode metadata: script or module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub script: Option<ScriptMeta>,
    #[serde(default)]
    pub module: Option<ModuleMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_write_op_decodes() {
        let json = r#"{"op":"truncate","path":{"address":"01","path":"02"},"value":""}"#;
        let value: WriteSetValue = serde_json::from_str(json).unwrap();
        assert_eq!(value.op, WriteOp::Unknown);
    }

    #[test]
    fn test_status_codes() {
        let abort = ExecutionStatus::Abort {
            code: 7,
            location: Some(AbortLocation {
                address: vec![1],
                module: "M".to_string(),
            }),
        };
        let (major, sub, location) = abort.codes();
        assert_eq!((major, sub), (VM_ABORTED_CODE, 7));
        assert_eq!(location.map(|l| l.module.as_str()), Some("M"));

        assert_eq!(ExecutionStatus::Success.codes().0, VM_EXECUTED_CODE);
        assert_eq!(
            ExecutionStatus::MoveError { status_code: 1001 }.codes(),
            (1001, 0, None)
        );
    }

    #[test]
    fn test_execute_request_requires_exactly_one_kind() {
        assert!(ExecuteRequest::from_parts(None, None).is_err());

        let module = PublishModuleRequest {
            sender: Address::STDLIB,
            max_gas_amount: 1,
            gas_unit_price: 1,
            code: vec![1],
        };
        let script = ExecuteScriptRequest {
            senders: vec![Address::STDLIB],
            max_gas_amount: 1,
            gas_unit_price: 1,
            block: 0,
            timestamp: 0,
            code: vec![2],
            type_params: vec![],
            args: vec![],
        };
        assert!(ExecuteRequest::from_parts(Some(module.clone()), Some(script.clone())).is_err());
        assert_eq!(
            ExecuteRequest::from_parts(Some(module), None).unwrap().kind(),
            "publish_module"
        );
        assert_eq!(
            ExecuteRequest::from_parts(None, Some(script)).unwrap().kind(),
            "execute_script"
        );
    }

    #[test]
    fn test_vm_arg_from_script_arg() {
        let arg = VmArg::from(&ScriptArg::U64(2));
        assert_eq!(arg.type_tag, VmTypeTag::U64);
        assert_eq!(arg.value, vec![2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_response_json_roundtrip() {
        let response = ExecuteResponse::success(
            vec![WriteSetValue::set(AccessPath::new(vec![1], vec![2]), vec![3])],
            vec![],
        );
        let json = serde_json::to_string(&response).unwrap();
        let back: ExecuteResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
