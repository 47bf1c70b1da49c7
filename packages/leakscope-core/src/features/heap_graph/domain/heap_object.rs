//! Heap objects
//!
//! Every record of a dump is one of four shapes: a class, an instance, an
//! array of references or an array of primitives. Values are immutable for the
//! lifetime of an analysis.

use serde::{Deserialize, Serialize};

/// Stable 64-bit object identifier
pub type ObjectId = u64;

// ═══════════════════════════════════════════════════════════════════════════
// Values
// ═══════════════════════════════════════════════════════════════════════════

/// Element type of a primitive array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl PrimitiveType {
    /// Size of one element in bytes
    pub fn byte_size(&self) -> u32 {
        match self {
            Self::Boolean | Self::Byte => 1,
            Self::Char | Self::Short => 2,
            Self::Float | Self::Int => 4,
            Self::Double | Self::Long => 8,
        }
    }

    /// Name of the array class holding this element type, e.g. `int[]`
    pub fn array_class_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean[]",
            Self::Char => "char[]",
            Self::Float => "float[]",
            Self::Double => "double[]",
            Self::Byte => "byte[]",
            Self::Short => "short[]",
            Self::Int => "int[]",
            Self::Long => "long[]",
        }
    }
}

/// Value of a field: either a primitive or a (nullable) reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Reference(Option<ObjectId>),
    Boolean(bool),
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl FieldValue {
    /// Shorthand for a non-null reference
    pub fn reference(id: ObjectId) -> Self {
        Self::Reference(Some(id))
    }

    /// Shorthand for a null reference
    pub fn null() -> Self {
        Self::Reference(None)
    }

    /// Target id if this is a non-null reference
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Reference(id) => *id,
            _ => None,
        }
    }

    pub fn is_null_reference(&self) -> bool {
        matches!(self, Self::Reference(None))
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Widening read of any integral value
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Byte(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Storage size of this value, given the dump's identifier size
    pub fn byte_size(&self, identifier_byte_size: u32) -> u32 {
        match self {
            Self::Reference(_) => identifier_byte_size,
            Self::Boolean(_) | Self::Byte(_) => 1,
            Self::Char(_) | Self::Short(_) => 2,
            Self::Int(_) | Self::Float(_) => 4,
            Self::Long(_) | Self::Double(_) => 8,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════════

/// Static field of a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticField {
    pub name: String,
    pub value: FieldValue,
}

/// Instance field, tagged with the class that declares it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceField {
    pub declaring_class: String,
    pub name: String,
    pub value: FieldValue,
}

/// A loaded class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapClass {
    pub object_id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub superclass_id: Option<ObjectId>,
    /// Full byte size of one instance, superclass fields included
    #[serde(default)]
    pub instance_byte_size: u32,
    #[serde(default)]
    pub static_fields: Vec<StaticField>,
}

impl HeapClass {
    pub fn new(object_id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            object_id,
            name: name.into(),
            superclass_id: None,
            instance_byte_size: 0,
            static_fields: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, superclass_id: ObjectId) -> Self {
        self.superclass_id = Some(superclass_id);
        self
    }

    pub fn with_instance_byte_size(mut self, size: u32) -> Self {
        self.instance_byte_size = size;
        self
    }

    pub fn with_static_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.static_fields.push(StaticField {
            name: name.into(),
            value,
        });
        self
    }

    /// Class name without its package
    pub fn simple_name(&self) -> &str {
        crate::shared::utils::last_segment(&self.name, '.')
    }
}

/// An instance of a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapInstance {
    pub object_id: ObjectId,
    pub class_id: ObjectId,
    pub class_name: String,
    /// Fields ordered from the instance's own class up to its root superclass
    #[serde(default)]
    pub fields: Vec<InstanceField>,
}

impl HeapInstance {
    /// Read a field declared by a specific class
    pub fn read_field(&self, declaring_class: &str, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.declaring_class == declaring_class && f.name == name)
            .map(|f| &f.value)
    }

    /// Read the first field with this name, whichever class declares it
    pub fn field_named(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Array of references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapObjectArray {
    pub object_id: ObjectId,
    pub array_class_id: ObjectId,
    pub array_class_name: String,
    #[serde(default)]
    pub elements: Vec<Option<ObjectId>>,
}

/// Array of primitives
///
/// Contents are not kept, except decoded `text` for char and byte arrays that
/// back strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapPrimitiveArray {
    pub object_id: ObjectId,
    pub primitive_type: PrimitiveType,
    pub length: u32,
    #[serde(default)]
    pub text: Option<String>,
}

/// One heap record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeapObject {
    Class(HeapClass),
    Instance(HeapInstance),
    ObjectArray(HeapObjectArray),
    PrimitiveArray(HeapPrimitiveArray),
}

impl HeapObject {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Class(c) => c.object_id,
            Self::Instance(i) => i.object_id,
            Self::ObjectArray(a) => a.object_id,
            Self::PrimitiveArray(a) => a.object_id,
        }
    }

    /// Name used when reporting this object
    ///
    /// For a class this is the class's own name; for everything else it is
    /// the name of the object's class.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Class(c) => &c.name,
            Self::Instance(i) => &i.class_name,
            Self::ObjectArray(a) => &a.array_class_name,
            Self::PrimitiveArray(a) => a.primitive_type.array_class_name(),
        }
    }

    pub fn as_class(&self) -> Option<&HeapClass> {
        match self {
            Self::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&HeapInstance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_object_array(&self) -> Option<&HeapObjectArray> {
        match self {
            Self::ObjectArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_primitive_array(&self) -> Option<&HeapPrimitiveArray> {
        match self {
            Self::PrimitiveArray(a) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::reference(7).as_object_id(), Some(7));
        assert_eq!(FieldValue::null().as_object_id(), None);
        assert!(FieldValue::null().is_null_reference());
        assert_eq!(FieldValue::Int(3).as_long(), Some(3));
        assert_eq!(FieldValue::Boolean(true).as_int(), None);
        assert_eq!(FieldValue::Long(1).byte_size(4), 8);
        assert_eq!(FieldValue::null().byte_size(4), 4);
    }

    #[test]
    fn test_instance_field_lookup_respects_declaring_class() {
        let instance = HeapInstance {
            object_id: 10,
            class_id: 1,
            class_name: "com.example.Child".to_string(),
            fields: vec![
                InstanceField {
                    declaring_class: "com.example.Child".to_string(),
                    name: "value".to_string(),
                    value: FieldValue::Int(1),
                },
                InstanceField {
                    declaring_class: "com.example.Parent".to_string(),
                    name: "value".to_string(),
                    value: FieldValue::Int(2),
                },
            ],
        };

        assert_eq!(instance.field_named("value"), Some(&FieldValue::Int(1)));
        assert_eq!(
            instance.read_field("com.example.Parent", "value"),
            Some(&FieldValue::Int(2))
        );
        assert_eq!(instance.read_field("com.example.Other", "value"), None);
    }

    #[test]
    fn test_class_name_per_variant() {
        let class = HeapObject::Class(HeapClass::new(1, "com.example.Foo"));
        assert_eq!(class.class_name(), "com.example.Foo");
        assert_eq!(class.as_class().map(|c| c.simple_name()), Some("Foo"));

        let array = HeapObject::PrimitiveArray(HeapPrimitiveArray {
            object_id: 2,
            primitive_type: PrimitiveType::Char,
            length: 4,
            text: Some("main".to_string()),
        });
        assert_eq!(array.class_name(), "char[]");
        assert_eq!(array.object_id(), 2);
    }

    #[test]
    fn test_heap_object_json_shape() {
        let json = r#"{"kind":"instance","object_id":5,"class_id":1,"class_name":"A",
            "fields":[{"declaring_class":"A","name":"b","value":{"type":"reference","value":6}}]}"#;
        let object: HeapObject = serde_json::from_str(json).unwrap();
        let instance = object.as_instance().unwrap();
        assert_eq!(instance.field_named("b").and_then(|v| v.as_object_id()), Some(6));
    }
}
