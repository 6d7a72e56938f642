//! A serde `Serializer` whose output is a [`Key`] tree instead of text.

use serde::ser::{self, Serialize};
use std::convert::TryFrom;

use crate::error::KeyError;
use crate::key::Key;

pub(crate) struct KeySerializer;

fn variant_name(name: &str, variant: &str) -> String {
    format!("{}::{}", name, variant)
}

impl ser::Serializer for KeySerializer {
    type Ok = Key;
    type Error = KeyError;

    type SerializeSeq = SerializeSeq;
    type SerializeTuple = SerializeSeq;
    type SerializeTupleStruct = SerializeRecord;
    type SerializeTupleVariant = SerializeRecord;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeRecord;

    fn serialize_bool(self, v: bool) -> Result<Key, KeyError> {
        Ok(Key::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Key, KeyError> {
        Ok(Key::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Key, KeyError> {
        Ok(Key::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Key, KeyError> {
        Ok(Key::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Key, KeyError> {
        Ok(Key::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Key, KeyError> {
        Ok(Key::Int(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Key, KeyError> {
        Ok(Key::Int(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Key, KeyError> {
        Ok(Key::Int(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Key, KeyError> {
        i64::try_from(v).map(Key::Int).map_err(|_| {
            KeyError::unsupported(format_args!(
                "integer {} does not fit in an i64",
                v
            ))
        })
    }

    fn serialize_f32(self, v: f32) -> Result<Key, KeyError> {
        Ok(Key::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Key, KeyError> {
        Ok(Key::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Key, KeyError> {
        Ok(Key::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Key, KeyError> {
        Ok(Key::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Key, KeyError> {
        Ok(Key::Seq(v.iter().map(|b| Key::Int(i64::from(*b))).collect()))
    }

    fn serialize_none(self) -> Result<Key, KeyError> {
        Ok(Key::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Key, KeyError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Key, KeyError> {
        Ok(Key::Null)
    }

    fn serialize_unit_struct(
        self,
        name: &'static str,
    ) -> Result<Key, KeyError> {
        Ok(Key::Record {
            name: name.to_owned(),
            fields: Vec::new(),
        })
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Key, KeyError> {
        Ok(Key::Record {
            name: variant_name(name, variant),
            fields: Vec::new(),
        })
    }

    fn serialize_newtype_struct<T>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Key, KeyError>
    where
        T: ?Sized + Serialize,
    {
        Ok(Key::Record {
            name: name.to_owned(),
            fields: vec![("0".to_owned(), value.serialize(KeySerializer)?)],
        })
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Key, KeyError>
    where
        T: ?Sized + Serialize,
    {
        Ok(Key::Record {
            name: variant_name(name, variant),
            fields: vec![("0".to_owned(), value.serialize(KeySerializer)?)],
        })
    }

    fn serialize_seq(
        self,
        len: Option<usize>,
    ) -> Result<SerializeSeq, KeyError> {
        Ok(SerializeSeq {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSeq, KeyError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<SerializeRecord, KeyError> {
        Ok(SerializeRecord::new(name.to_owned(), len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeRecord, KeyError> {
        Ok(SerializeRecord::new(variant_name(name, variant), len))
    }

    fn serialize_map(
        self,
        len: Option<usize>,
    ) -> Result<SerializeMap, KeyError> {
        Ok(SerializeMap {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<SerializeRecord, KeyError> {
        Ok(SerializeRecord::new(name.to_owned(), len))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeRecord, KeyError> {
        Ok(SerializeRecord::new(variant_name(name, variant), len))
    }
}

pub(crate) struct SerializeSeq {
    items: Vec<Key>,
}

impl ser::SerializeSeq for SerializeSeq {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(KeySerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Key, KeyError> {
        Ok(Key::Seq(self.items))
    }
}

impl ser::SerializeTuple for SerializeSeq {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Key, KeyError> {
        ser::SerializeSeq::end(self)
    }
}

/// Collects the fields of structs, tuple structs and enum variants. Tuple
/// fields are named by their position.
pub(crate) struct SerializeRecord {
    name: String,
    fields: Vec<(String, Key)>,
}

impl SerializeRecord {
    fn new(name: String, len: usize) -> Self {
        Self {
            name,
            fields: Vec::with_capacity(len),
        }
    }

    fn push_positional<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        let position = self.fields.len().to_string();
        self.fields.push((position, value.serialize(KeySerializer)?));
        Ok(())
    }

    fn push_named<T>(&mut self, name: &str, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.fields
            .push((name.to_owned(), value.serialize(KeySerializer)?));
        Ok(())
    }

    fn finish(self) -> Key {
        Key::Record {
            name: self.name,
            fields: self.fields,
        }
    }
}

impl ser::SerializeTupleStruct for SerializeRecord {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push_positional(value)
    }

    fn end(self) -> Result<Key, KeyError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeRecord {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push_positional(value)
    }

    fn end(self) -> Result<Key, KeyError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_field<T>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push_named(key, value)
    }

    fn end(self) -> Result<Key, KeyError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeRecord {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_field<T>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push_named(key, value)
    }

    fn end(self) -> Result<Key, KeyError> {
        Ok(self.finish())
    }
}

pub(crate) struct SerializeMap {
    entries: Vec<(Key, Key)>,
    pending_key: Option<Key>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Key;
    type Error = KeyError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| KeyError::unsupported("map value without a key"))?;
        self.entries.push((key, value.serialize(KeySerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Key, KeyError> {
        Ok(Key::Map(self.entries))
    }
}
