//! Intermediate value model and schema descriptors.
//!
//! These types are shared between the wire decoder (in the report-decoder
//! crate) and the normalizer (here). A [`ProtoMessage`] mirrors the wire
//! schema exactly: snake_case field names, repeated fields as ordered
//! sequences, nested messages as sub-objects. It exists only between the
//! decoder and the normalizer; nothing retains it afterwards.

use std::collections::HashMap;

/// A single decoded field value.
///
/// 64-bit integers stay native `i64`/`u64`; Rust carries them losslessly, so
/// the stringly representation some dynamic runtimes need does not apply.
/// Enum fields carry their symbolic name rather than the numeric code.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoFieldValue {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Enum(String),
    Message(Box<ProtoMessage>),
    Repeated(Vec<ProtoFieldValue>),
}

/// A decoded message: the schema-shaped intermediate object.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessage {
    /// Fully qualified message type name (e.g. "verumomnis.AnalysisResult")
    pub message_type: String,
    /// Decoded field values keyed by wire field name
    pub fields: HashMap<String, ProtoFieldValue>,
}

impl ProtoMessage {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            fields: HashMap::new(),
        }
    }
}

/// Protobuf field type as declared in the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    /// Nested message type name
    Message(String),
    /// Enum type name
    Enum(String),
}

impl ProtoType {
    pub fn type_name(&self) -> String {
        match self {
            ProtoType::Double => "double".to_string(),
            ProtoType::Float => "float".to_string(),
            ProtoType::Int32 => "int32".to_string(),
            ProtoType::Int64 => "int64".to_string(),
            ProtoType::Uint32 => "uint32".to_string(),
            ProtoType::Uint64 => "uint64".to_string(),
            ProtoType::Sint32 => "sint32".to_string(),
            ProtoType::Sint64 => "sint64".to_string(),
            ProtoType::Fixed32 => "fixed32".to_string(),
            ProtoType::Fixed64 => "fixed64".to_string(),
            ProtoType::Sfixed32 => "sfixed32".to_string(),
            ProtoType::Sfixed64 => "sfixed64".to_string(),
            ProtoType::Bool => "bool".to_string(),
            ProtoType::String => "string".to_string(),
            ProtoType::Bytes => "bytes".to_string(),
            ProtoType::Message(name) => format!("message:{name}"),
            ProtoType::Enum(name) => format!("enum:{name}"),
        }
    }
}

impl std::fmt::Display for ProtoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Describes a single field in a message.
#[derive(Debug, Clone)]
pub struct ProtoFieldDescriptor {
    /// Field name as declared in the schema
    pub name: String,
    /// Field number (tag); the wire compatibility contract
    pub number: i32,
    /// Declared field type
    pub field_type: ProtoType,
    /// Whether the field is repeated
    pub is_repeated: bool,
    /// Whether the field is explicitly optional
    pub is_optional: bool,
}

/// Describes a protobuf message type.
///
/// Fields are kept in declaration order; the decoder looks them up by wire
/// number, the normalizer by name.
#[derive(Debug, Clone)]
pub struct ProtoMessageDescriptor {
    /// Fully qualified message name (e.g. "verumomnis.AnalysisResult")
    pub name: String,
    /// Field descriptors in declaration order
    pub fields: Vec<ProtoFieldDescriptor>,
}

impl ProtoMessageDescriptor {
    /// Get a field descriptor by name.
    pub fn field(&self, name: &str) -> Option<&ProtoFieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a field descriptor by wire number.
    pub fn field_by_number(&self, number: i32) -> Option<&ProtoFieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Describes an enum type: symbolic names by numeric value.
#[derive(Debug, Clone)]
pub struct ProtoEnumDescriptor {
    /// Fully qualified enum name
    pub name: String,
    /// (symbolic name, numeric value) pairs in declaration order
    pub values: Vec<(String, i32)>,
}

impl ProtoEnumDescriptor {
    /// Resolve a numeric value to its symbolic name.
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| name.as_str())
    }
}

/// A compiled wire schema: message and enum descriptors keyed by simple name.
#[derive(Debug, Clone)]
pub struct ProtoSchema {
    /// Message descriptors by simple (unqualified) name
    pub messages: HashMap<String, ProtoMessageDescriptor>,
    /// Enum descriptors by simple (unqualified) name
    pub enums: HashMap<String, ProtoEnumDescriptor>,
}

impl ProtoSchema {
    /// Get a message descriptor by simple name.
    pub fn get_message(&self, name: &str) -> Option<&ProtoMessageDescriptor> {
        self.messages.get(name)
    }

    /// Get an enum descriptor by simple name.
    pub fn get_enum(&self, name: &str) -> Option<&ProtoEnumDescriptor> {
        self.enums.get(name)
    }

    /// List all message type names in the schema.
    pub fn list_messages(&self) -> Vec<String> {
        self.messages.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ProtoMessageDescriptor {
        ProtoMessageDescriptor {
            name: "verumomnis.TopLiability".to_string(),
            fields: vec![
                ProtoFieldDescriptor {
                    name: "name".to_string(),
                    number: 1,
                    field_type: ProtoType::String,
                    is_repeated: false,
                    is_optional: false,
                },
                ProtoFieldDescriptor {
                    name: "severity".to_string(),
                    number: 2,
                    field_type: ProtoType::String,
                    is_repeated: false,
                    is_optional: false,
                },
            ],
        }
    }

    #[test]
    fn test_field_lookup_by_number() {
        let desc = descriptor();
        assert_eq!(desc.field_by_number(2).unwrap().name, "severity");
        assert!(desc.field_by_number(3).is_none());
    }

    #[test]
    fn test_field_lookup_by_name() {
        let desc = descriptor();
        assert_eq!(desc.field("name").unwrap().number, 1);
        assert!(desc.field("missing").is_none());
    }

    #[test]
    fn test_enum_name_resolution() {
        let desc = ProtoEnumDescriptor {
            name: "verumomnis.Severity".to_string(),
            values: vec![
                ("SEVERITY_UNSPECIFIED".to_string(), 0),
                ("SEVERITY_HIGH".to_string(), 2),
            ],
        };
        assert_eq!(desc.name_of(2), Some("SEVERITY_HIGH"));
        assert_eq!(desc.name_of(7), None);
    }

    #[test]
    fn test_proto_type_display() {
        assert_eq!(ProtoType::Uint32.to_string(), "uint32");
        assert_eq!(
            ProtoType::Message("PreAnalysisChecks".to_string()).to_string(),
            "message:PreAnalysisChecks"
        );
    }
}
