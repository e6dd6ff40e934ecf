//! Runtime protobuf wire decoder.
//!
//! Decodes binary report payloads into the schema-shaped intermediate
//! [`ProtoMessage`] using the compiled descriptors from the schema registry.
//! Pure and deterministic: identical bytes always yield an identical
//! intermediate object.
//!
//! Forward-compatibility policy: field numbers unknown to the schema are
//! skipped by wire type and never an error. A known field whose wire type
//! contradicts its declared type is [`Error::MalformedPayload`], as are
//! truncated buffers, bad varints and invalid UTF-8 in string fields.

use crate::error::{Error, Result};
use crate::schema::SchemaProvider;
use protobuf::CodedInputStream;
use report_types::{
    ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage, ProtoMessageDescriptor, ProtoSchema,
    ProtoType,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN: u32 = 2;
const WIRE_FIXED32: u32 = 5;

/// Descriptor-driven decoder for report payloads.
pub struct ReportDecoder {
    provider: Arc<SchemaProvider>,
}

impl ReportDecoder {
    /// Create a decoder over a shared schema provider.
    pub fn new(provider: Arc<SchemaProvider>) -> Self {
        Self { provider }
    }

    /// Decode a payload as the provider's top-level message type.
    pub fn decode(&self, data: &[u8]) -> Result<ProtoMessage> {
        let schema = self.provider.ensure_ready()?;
        let descriptor = schema
            .get_message(self.provider.message_type())
            .ok_or_else(|| Error::MessageTypeNotFound(self.provider.message_type().to_string()))?;

        debug!(
            "Decoding {} bytes as {}",
            data.len(),
            self.provider.message_type()
        );
        let mut stream = CodedInputStream::from_bytes(data);
        decode_message(&schema, descriptor, &mut stream)
    }
}

fn decode_message(
    schema: &ProtoSchema,
    descriptor: &ProtoMessageDescriptor,
    stream: &mut CodedInputStream,
) -> Result<ProtoMessage> {
    let mut fields: HashMap<String, ProtoFieldValue> = HashMap::new();

    while !stream.eof().map_err(malformed)? {
        let tag = stream.read_raw_varint32().map_err(malformed)?;
        let field_number = (tag >> 3) as i32;
        let wire_type = tag & 0x7;

        if field_number == 0 {
            return Err(Error::MalformedPayload(format!(
                "field number 0 in message {}",
                descriptor.name
            )));
        }

        let Some(field_desc) = descriptor.field_by_number(field_number) else {
            // Unknown field: skip, keep decoding. Standard forward
            // compatibility with artifacts from newer schema revisions.
            debug!(
                "Skipping unknown field number {} in message {}",
                field_number, descriptor.name
            );
            skip_field(stream, wire_type)?;
            continue;
        };

        if field_desc.is_repeated && wire_type == WIRE_LEN && is_packable(&field_desc.field_type) {
            decode_packed(schema, field_desc, stream, &mut fields)?;
            continue;
        }

        check_wire_type(descriptor, field_desc, wire_type)?;
        let value = decode_value(schema, &field_desc.field_type, stream)?;

        if field_desc.is_repeated {
            let entry = fields
                .entry(field_desc.name.clone())
                .or_insert_with(|| ProtoFieldValue::Repeated(Vec::new()));
            if let ProtoFieldValue::Repeated(items) = entry {
                items.push(value);
            }
        } else {
            fields.insert(field_desc.name.clone(), value);
        }
    }

    Ok(ProtoMessage {
        message_type: descriptor.name.clone(),
        fields,
    })
}

fn decode_value(
    schema: &ProtoSchema,
    field_type: &ProtoType,
    stream: &mut CodedInputStream,
) -> Result<ProtoFieldValue> {
    Ok(match field_type {
        ProtoType::Double => ProtoFieldValue::Double(stream.read_double().map_err(malformed)?),
        ProtoType::Float => ProtoFieldValue::Float(stream.read_float().map_err(malformed)?),
        ProtoType::Int32 => ProtoFieldValue::Int32(stream.read_int32().map_err(malformed)?),
        ProtoType::Int64 => ProtoFieldValue::Int64(stream.read_int64().map_err(malformed)?),
        ProtoType::Uint32 => ProtoFieldValue::Uint32(stream.read_uint32().map_err(malformed)?),
        ProtoType::Uint64 => ProtoFieldValue::Uint64(stream.read_uint64().map_err(malformed)?),
        ProtoType::Sint32 => ProtoFieldValue::Int32(stream.read_sint32().map_err(malformed)?),
        ProtoType::Sint64 => ProtoFieldValue::Int64(stream.read_sint64().map_err(malformed)?),
        ProtoType::Fixed32 => ProtoFieldValue::Uint32(stream.read_fixed32().map_err(malformed)?),
        ProtoType::Fixed64 => ProtoFieldValue::Uint64(stream.read_fixed64().map_err(malformed)?),
        ProtoType::Sfixed32 => ProtoFieldValue::Int32(stream.read_sfixed32().map_err(malformed)?),
        ProtoType::Sfixed64 => ProtoFieldValue::Int64(stream.read_sfixed64().map_err(malformed)?),
        ProtoType::Bool => ProtoFieldValue::Bool(stream.read_bool().map_err(malformed)?),
        ProtoType::String => ProtoFieldValue::String(stream.read_string().map_err(malformed)?),
        ProtoType::Bytes => ProtoFieldValue::Bytes(stream.read_bytes().map_err(malformed)?),
        ProtoType::Message(type_name) => {
            let len = stream.read_raw_varint32().map_err(malformed)?;
            let old_limit = stream.push_limit(len as u64).map_err(malformed)?;

            let simple_type = type_name.split('.').next_back().unwrap_or(type_name);
            let nested_descriptor = schema
                .get_message(simple_type)
                .ok_or_else(|| Error::MessageTypeNotFound(simple_type.to_string()))?;
            let nested_message = decode_message(schema, nested_descriptor, stream)?;

            stream.pop_limit(old_limit);
            ProtoFieldValue::Message(Box::new(nested_message))
        }
        ProtoType::Enum(type_name) => {
            let number = stream.read_int32().map_err(malformed)?;
            let simple_type = type_name.split('.').next_back().unwrap_or(type_name);
            // Unknown enum numbers keep their decimal text; the schema may
            // be older than the producer.
            let symbol = schema
                .get_enum(simple_type)
                .and_then(|e| e.name_of(number))
                .map(str::to_string)
                .unwrap_or_else(|| number.to_string());
            ProtoFieldValue::Enum(symbol)
        }
    })
}

/// Decode a packed repeated scalar field into the accumulated sequence.
fn decode_packed(
    schema: &ProtoSchema,
    field_desc: &ProtoFieldDescriptor,
    stream: &mut CodedInputStream,
    fields: &mut HashMap<String, ProtoFieldValue>,
) -> Result<()> {
    let len = stream.read_raw_varint32().map_err(malformed)?;
    let old_limit = stream.push_limit(len as u64).map_err(malformed)?;

    let entry = fields
        .entry(field_desc.name.clone())
        .or_insert_with(|| ProtoFieldValue::Repeated(Vec::new()));
    if let ProtoFieldValue::Repeated(items) = entry {
        while !stream.eof().map_err(malformed)? {
            items.push(decode_value(schema, &field_desc.field_type, stream)?);
        }
    }

    stream.pop_limit(old_limit);
    Ok(())
}

/// Skip an unknown field by its wire type.
fn skip_field(stream: &mut CodedInputStream, wire_type: u32) -> Result<()> {
    match wire_type {
        WIRE_VARINT => {
            stream.read_raw_varint64().map_err(malformed)?;
        }
        WIRE_FIXED64 => {
            stream.read_fixed64().map_err(malformed)?;
        }
        WIRE_LEN => {
            stream.read_bytes().map_err(malformed)?;
        }
        WIRE_FIXED32 => {
            stream.read_fixed32().map_err(malformed)?;
        }
        other => {
            return Err(Error::MalformedPayload(format!(
                "unsupported wire type {other}"
            )));
        }
    }
    Ok(())
}

/// Reject a known field encoded with the wrong wire type.
fn check_wire_type(
    descriptor: &ProtoMessageDescriptor,
    field_desc: &ProtoFieldDescriptor,
    wire_type: u32,
) -> Result<()> {
    let expected = expected_wire_type(&field_desc.field_type);
    if wire_type != expected {
        return Err(Error::MalformedPayload(format!(
            "field {} of {} declared {} (wire type {expected}) but encoded with wire type {wire_type}",
            field_desc.name, descriptor.name, field_desc.field_type
        )));
    }
    Ok(())
}

fn expected_wire_type(field_type: &ProtoType) -> u32 {
    match field_type {
        ProtoType::Double | ProtoType::Fixed64 | ProtoType::Sfixed64 => WIRE_FIXED64,
        ProtoType::Float | ProtoType::Fixed32 | ProtoType::Sfixed32 => WIRE_FIXED32,
        ProtoType::String | ProtoType::Bytes | ProtoType::Message(_) => WIRE_LEN,
        _ => WIRE_VARINT,
    }
}

fn is_packable(field_type: &ProtoType) -> bool {
    !matches!(
        field_type,
        ProtoType::String | ProtoType::Bytes | ProtoType::Message(_)
    )
}

fn malformed(e: protobuf::Error) -> Error {
    Error::MalformedPayload(e.to_string())
}
