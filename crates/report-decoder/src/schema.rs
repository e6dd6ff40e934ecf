//! Schema registry: embedded wire schema and its lazy compilation.
//!
//! The `.proto` text shipped with this crate is compiled into descriptors at
//! runtime with `protobuf-parse`; no code generation step. [`SchemaProvider`]
//! owns the compilation: constructed once at application startup, shared by
//! reference, compiled on first use. A failed compile is cached for the
//! process session and reported as [`Error::SchemaUnavailable`] on every
//! subsequent call; retrying against the same schema text cannot succeed.

use crate::error::{Error, Result};
use protobuf::descriptor::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto};
use protobuf_parse::Parser;
use report_types::{
    ProtoEnumDescriptor, ProtoFieldDescriptor, ProtoMessageDescriptor, ProtoSchema, ProtoType,
};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// The embedded wire schema for `.verum.bin` analysis report artifacts.
pub const REPORT_SCHEMA: &str = include_str!("../proto/report.proto");

/// Top-level message type every report payload encodes.
pub const REPORT_MESSAGE_TYPE: &str = "AnalysisResult";

/// Lazily compiled, process-shared schema handle.
///
/// The `OnceLock` is the only shared-mutable state in the pipeline: the first
/// caller compiles, concurrent callers block on the in-flight compile, and
/// everyone observes the same cached instance afterwards.
pub struct SchemaProvider {
    proto_text: String,
    message_type: String,
    compiled: OnceLock<std::result::Result<Arc<ProtoSchema>, String>>,
}

impl SchemaProvider {
    /// Provider over the embedded report schema.
    pub fn embedded() -> Self {
        Self::new(REPORT_SCHEMA, REPORT_MESSAGE_TYPE)
    }

    /// Provider over arbitrary schema text and top-level message type.
    pub fn new(proto_text: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            proto_text: proto_text.into(),
            message_type: message_type.into(),
            compiled: OnceLock::new(),
        }
    }

    /// Name of the top-level message type payloads decode against.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Compile the schema on first call and return the cached instance.
    ///
    /// Idempotent: N calls trigger exactly one parse and yield the same
    /// `Arc`. A compile failure is equally sticky.
    pub fn ensure_ready(&self) -> Result<Arc<ProtoSchema>> {
        let compiled = self.compiled.get_or_init(|| {
            info!("Compiling report schema (first use)");
            let schema = parse_schema(&self.proto_text).map_err(|e| e.to_string())?;
            if schema.get_message(&self.message_type).is_none() {
                return Err(format!(
                    "schema does not define message type {}",
                    self.message_type
                ));
            }
            Ok(Arc::new(schema))
        });
        match compiled {
            Ok(schema) => Ok(Arc::clone(schema)),
            Err(e) => Err(Error::SchemaUnavailable(e.clone())),
        }
    }

    /// The compiled descriptor for the top-level message type.
    pub fn descriptor(&self) -> Result<ProtoMessageDescriptor> {
        let schema = self.ensure_ready()?;
        schema
            .get_message(&self.message_type)
            .cloned()
            .ok_or_else(|| Error::MessageTypeNotFound(self.message_type.clone()))
    }
}

impl std::fmt::Debug for SchemaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaProvider")
            .field("message_type", &self.message_type)
            .field("compiled", &self.compiled.get().map(|r| r.is_ok()))
            .finish()
    }
}

/// Parse `.proto` schema text into a [`ProtoSchema`].
///
/// `protobuf-parse` reads paths, so the text goes through a temp file.
/// Nested message types are collected recursively under their simple names;
/// the wire format references them by the trailing path segment.
pub fn parse_schema(content: &str) -> Result<ProtoSchema> {
    use std::io::Write;
    use tempfile::Builder;

    let mut temp_file = Builder::new()
        .suffix(".proto")
        .tempfile()
        .map_err(|e| Error::SchemaUnavailable(format!("Failed to create temp file: {e}")))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::SchemaUnavailable(format!("Failed to write temp file: {e}")))?;
    let temp_path = temp_file.path();

    let mut parser = Parser::new();
    if let Some(dir) = temp_path.parent() {
        parser.include(dir);
    }
    parser.input(temp_path);
    let parsed = parser
        .parse_and_typecheck()
        .map_err(|e| Error::SchemaUnavailable(e.to_string()))?;

    let file_descriptor = parsed
        .file_descriptors
        .into_iter()
        .next()
        .ok_or_else(|| Error::SchemaUnavailable("No file descriptor found".to_string()))?;

    let mut messages = HashMap::new();
    let mut enums = HashMap::new();

    let package = file_descriptor.package.clone().unwrap_or_default();
    for message in &file_descriptor.message_type {
        collect_message(&package, message, &mut messages, &mut enums)?;
    }
    for enum_type in &file_descriptor.enum_type {
        collect_enum(&package, enum_type, &mut enums);
    }

    debug!(
        "Compiled schema with {} message types and {} enums",
        messages.len(),
        enums.len()
    );
    Ok(ProtoSchema { messages, enums })
}

fn collect_message(
    scope: &str,
    message: &DescriptorProto,
    messages: &mut HashMap<String, ProtoMessageDescriptor>,
    enums: &mut HashMap<String, ProtoEnumDescriptor>,
) -> Result<()> {
    let simple_name = message.name.clone().unwrap_or_default();
    if simple_name.is_empty() {
        return Ok(());
    }
    let qualified = qualify(scope, &simple_name);

    let mut fields = Vec::new();
    for field in &message.field {
        let field_name = field.name.clone().unwrap_or_default();
        if field_name.is_empty() {
            continue;
        }

        fields.push(ProtoFieldDescriptor {
            name: field_name,
            number: field.number.unwrap_or(0),
            field_type: parse_field_type(field)?,
            is_repeated: field.label
                == Some(protobuf::descriptor::field_descriptor_proto::Label::LABEL_REPEATED.into()),
            is_optional: field.label
                == Some(protobuf::descriptor::field_descriptor_proto::Label::LABEL_OPTIONAL.into()),
        });
    }

    messages.insert(
        simple_name,
        ProtoMessageDescriptor {
            name: qualified.clone(),
            fields,
        },
    );

    // Message declarations nest; the group-style sections of AnalysisResult
    // (PreAnalysisChecks etc.) live here, not at file level.
    for nested in &message.nested_type {
        collect_message(&qualified, nested, messages, enums)?;
    }
    for enum_type in &message.enum_type {
        collect_enum(&qualified, enum_type, enums);
    }

    Ok(())
}

fn collect_enum(
    scope: &str,
    enum_type: &EnumDescriptorProto,
    enums: &mut HashMap<String, ProtoEnumDescriptor>,
) {
    let simple_name = enum_type.name.clone().unwrap_or_default();
    if simple_name.is_empty() {
        return;
    }
    let values = enum_type
        .value
        .iter()
        .map(|v| (v.name.clone().unwrap_or_default(), v.number.unwrap_or(0)))
        .collect();
    enums.insert(
        simple_name.clone(),
        ProtoEnumDescriptor {
            name: qualify(scope, &simple_name),
            values,
        },
    );
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

fn parse_field_type(field: &FieldDescriptorProto) -> Result<ProtoType> {
    use protobuf::descriptor::field_descriptor_proto::Type;

    let field_type_enum_or_unknown = field
        .type_
        .ok_or_else(|| Error::SchemaUnavailable("Field missing type".to_string()))?;
    let field_type_enum = field_type_enum_or_unknown.enum_value_or_default();

    Ok(match field_type_enum {
        Type::TYPE_DOUBLE => ProtoType::Double,
        Type::TYPE_FLOAT => ProtoType::Float,
        Type::TYPE_INT64 => ProtoType::Int64,
        Type::TYPE_UINT64 => ProtoType::Uint64,
        Type::TYPE_INT32 => ProtoType::Int32,
        Type::TYPE_FIXED64 => ProtoType::Fixed64,
        Type::TYPE_FIXED32 => ProtoType::Fixed32,
        Type::TYPE_BOOL => ProtoType::Bool,
        Type::TYPE_STRING => ProtoType::String,
        Type::TYPE_BYTES => ProtoType::Bytes,
        Type::TYPE_UINT32 => ProtoType::Uint32,
        Type::TYPE_SFIXED32 => ProtoType::Sfixed32,
        Type::TYPE_SFIXED64 => ProtoType::Sfixed64,
        Type::TYPE_SINT32 => ProtoType::Sint32,
        Type::TYPE_SINT64 => ProtoType::Sint64,
        Type::TYPE_MESSAGE => ProtoType::Message(field.type_name.clone().unwrap_or_default()),
        Type::TYPE_ENUM => ProtoType::Enum(field.type_name.clone().unwrap_or_default()),
        Type::TYPE_GROUP => {
            return Err(Error::SchemaUnavailable(
                "TYPE_GROUP is Proto2 syntax only and deprecated hence not supported".to_string(),
            ))
        }
    })
}
