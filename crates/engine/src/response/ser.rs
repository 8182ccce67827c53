use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serialize,
};

use super::{ResultArena, ResultMapId, ResultSlot, ResultValue};

pub(super) struct SerializableResultMap<'a> {
    pub arena: &'a ResultArena,
    pub id: ResultMapId,
}

impl Serialize for SerializableResultMap<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let Some(map) = self.arena.map(self.id) else {
            return serializer.serialize_none();
        };
        let mut state = serializer.serialize_map(None)?;
        for slot in map.slots() {
            // Empty slots belong to excluded selections or to tasks cut short by a cancellation.
            if let ResultSlot::Set { name, value, .. } = slot {
                state.serialize_entry(
                    name.as_str(),
                    &SerializableResultValue {
                        arena: self.arena,
                        value,
                    },
                )?;
            }
        }
        state.end()
    }
}

struct SerializableResultValue<'a> {
    arena: &'a ResultArena,
    value: &'a ResultValue,
}

impl Serialize for SerializableResultValue<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let items = match self.value {
            ResultValue::Null => return serializer.serialize_none(),
            ResultValue::Leaf(value) => return value.serialize(serializer),
            ResultValue::Map(id) => {
                return SerializableResultMap {
                    arena: self.arena,
                    id: *id,
                }
                .serialize(serializer)
            }
            ResultValue::MapList(id) => self.arena.map_list(*id).map(|list| list.items()),
            ResultValue::List(id) => self.arena.list(*id).map(|list| list.items()),
        };
        let Some(items) = items else {
            return serializer.serialize_none();
        };
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for value in items {
            seq.serialize_element(&SerializableResultValue {
                arena: self.arena,
                value,
            })?;
        }
        seq.end()
    }
}
