use async_graphql_value::Name;

use crate::pool::Reset;

macro_rules! node_id {
    ($name:ident, $display:literal) => {
        #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        pub(crate) struct $name(pub(super) u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $display, self.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $display, self.0)
            }
        }
    };
}

node_id!(ResultMapId, "Map");
node_id!(ResultMapListId, "MapList");
node_id!(ResultListId, "List");

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum ResultValue {
    #[default]
    Null,
    Leaf(serde_json::Value),
    Map(ResultMapId),
    MapList(ResultMapListId),
    List(ResultListId),
}

impl ResultValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResultValue::Null)
    }
}

/// Container holding a node, used to walk up the tree when repairing non-null violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResultParent {
    Map(ResultMapId),
    MapList(ResultMapListId),
    List(ResultListId),
}

/// Non-owning back reference: the container and the slot, response index or list index, holding
/// a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub container: ResultParent,
    pub index: u32,
}

impl ParentLink {
    pub fn new(container: ResultParent, index: usize) -> Self {
        Self {
            container,
            index: index as u32,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) enum ResultSlot {
    /// Not written yet, or never scheduled.
    #[default]
    Empty,
    Set {
        name: Name,
        value: ResultValue,
        is_nullable: bool,
    },
    Removed,
}

/// A GraphQL object. Slots are addressed by response index and written by distinct resolver tasks.
#[derive(Debug, Default)]
pub(crate) struct ResultMap {
    parent: Option<ParentLink>,
    slots: Vec<ResultSlot>,
    has_removed_slots: bool,
}

impl ResultMap {
    pub(super) fn initialize(&mut self, capacity: usize, parent: Option<ParentLink>) {
        self.parent = parent;
        self.slots.resize_with(capacity, Default::default);
    }

    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    /// Number of slots reserved at rent time, written or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[ResultSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ResultSlot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut ResultSlot> {
        self.slots.get_mut(index)
    }

    pub fn set_value(&mut self, index: usize, name: Name, value: ResultValue, is_nullable: bool) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = ResultSlot::Set {
                    name,
                    value,
                    is_nullable,
                };
                true
            }
            None => false,
        }
    }

    pub fn remove_value(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = ResultSlot::Removed;
            self.has_removed_slots = true;
        }
    }

    /// Drops tombstoned slots. Response indices are no longer valid afterwards, so this only runs
    /// once every writer is done.
    pub fn complete(&mut self) {
        if self.has_removed_slots {
            self.slots.retain(|slot| !matches!(slot, ResultSlot::Removed));
            self.has_removed_slots = false;
        }
    }
}

impl Reset for ResultMap {
    fn reset(&mut self) {
        self.parent = None;
        self.slots.clear();
        self.has_removed_slots = false;
    }
}

/// A list of objects, every item being either null or a map.
#[derive(Debug, Default)]
pub(crate) struct ResultMapList {
    pub(super) parent: Option<ParentLink>,
    pub(super) is_nullable: bool,
    pub(super) items: Vec<ResultValue>,
}

/// A list of leaves or of nested lists.
#[derive(Debug, Default)]
pub(crate) struct ResultList {
    pub(super) parent: Option<ParentLink>,
    pub(super) is_nullable: bool,
    pub(super) items: Vec<ResultValue>,
}

macro_rules! list_accessors {
    ($ty:ident) => {
        impl $ty {
            pub(super) fn initialize(&mut self, parent: ParentLink, is_nullable: bool) {
                self.parent = Some(parent);
                self.is_nullable = is_nullable;
            }

            pub fn parent(&self) -> Option<ParentLink> {
                self.parent
            }

            /// Whether items may be null.
            pub fn is_nullable(&self) -> bool {
                self.is_nullable
            }

            pub fn items(&self) -> &[ResultValue] {
                &self.items
            }

            pub fn set_items(&mut self, items: impl IntoIterator<Item = ResultValue>) {
                self.items.clear();
                self.items.extend(items);
            }

            pub fn set_null(&mut self, index: usize) -> bool {
                match self.items.get_mut(index) {
                    Some(item) => {
                        *item = ResultValue::Null;
                        true
                    }
                    None => false,
                }
            }
        }

        impl Reset for $ty {
            fn reset(&mut self) {
                self.parent = None;
                self.is_nullable = false;
                self.items.clear();
            }
        }
    };
}

list_accessors!(ResultMapList);
list_accessors!(ResultList);
