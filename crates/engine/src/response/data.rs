use serde::ser::{SerializeMap, SerializeSeq};

/// Response data under construction. Objects and lists live in flat arenas
/// and values point into them, so concurrent field resolution only ever
/// appends. Each container remembers the slot it hangs off, which lets error
/// bubbling walk toward the root without parent pointers.
pub struct ResponseData {
    objects: Vec<ResponseObject>,
    lists: Vec<ResponseList>,
    data_nulled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjectId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListId(usize);

#[derive(Debug, Clone, Copy)]
pub(crate) enum SlotId {
    Field { object: ObjectId, index: usize },
    Item { list: ListId, index: usize },
}

/// Where a container sits in its parent, and whether that slot tolerates
/// null.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Origin {
    pub slot: SlotId,
    pub nullable: bool,
}

pub(crate) enum ResponseValue {
    Null,
    Leaf(serde_json::Value),
    Object(ObjectId),
    List(ListId),
    /// Reserved when the field task is enqueued, written when it resolves.
    Pending,
}

struct ResponseObject {
    fields: Vec<(String, ResponseValue)>,
    origin: Option<Origin>,
}

struct ResponseList {
    items: Vec<ResponseValue>,
    origin: Origin,
}

impl ResponseData {
    pub(crate) fn new() -> Self {
        ResponseData {
            objects: vec![ResponseObject {
                fields: Vec::new(),
                origin: None,
            }],
            lists: Vec::new(),
            data_nulled: false,
        }
    }

    pub(crate) fn root(&self) -> ObjectId {
        ObjectId(0)
    }

    pub(crate) fn push_object(&mut self, origin: Origin) -> ObjectId {
        self.objects.push(ResponseObject {
            fields: Vec::new(),
            origin: Some(origin),
        });
        ObjectId(self.objects.len() - 1)
    }

    pub(crate) fn push_list(&mut self, origin: Origin) -> ListId {
        self.lists.push(ResponseList {
            items: Vec::new(),
            origin,
        });
        ListId(self.lists.len() - 1)
    }

    /// Appends a pending field slot. Slots are only ever appended, so the
    /// returned id stays valid for the whole execution.
    pub(crate) fn push_field(&mut self, object: ObjectId, response_key: String) -> SlotId {
        let fields = &mut self.objects[object.0].fields;
        fields.push((response_key, ResponseValue::Pending));
        SlotId::Field {
            object,
            index: fields.len() - 1,
        }
    }

    pub(crate) fn push_item(&mut self, list: ListId) -> SlotId {
        let items = &mut self.lists[list.0].items;
        items.push(ResponseValue::Pending);
        SlotId::Item {
            list,
            index: items.len() - 1,
        }
    }

    pub(crate) fn set(&mut self, slot: SlotId, value: ResponseValue) {
        match slot {
            SlotId::Field { object, index } => self.objects[object.0].fields[index].1 = value,
            SlotId::Item { list, index } => self.lists[list.0].items[index] = value,
        }
    }

    /// Nulls out `slot` if it tolerates null, otherwise bubbles up through
    /// the enclosing containers until a nullable slot absorbs the error.
    /// Reaching the root nulls the whole data payload.
    pub(crate) fn null_out(&mut self, mut slot: SlotId, mut nullable: bool) {
        loop {
            if nullable {
                self.set(slot, ResponseValue::Null);
                return;
            }
            let origin = match slot {
                SlotId::Field { object, .. } => self.objects[object.0].origin,
                SlotId::Item { list, .. } => Some(self.lists[list.0].origin),
            };
            match origin {
                Some(origin) => {
                    slot = origin.slot;
                    nullable = origin.nullable;
                }
                None => {
                    self.data_nulled = true;
                    return;
                }
            }
        }
    }
}

impl serde::Serialize for ResponseData {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.data_nulled {
            return serializer.serialize_unit();
        }
        ObjectView {
            data: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}

struct ObjectView<'a> {
    data: &'a ResponseData,
    id: ObjectId,
}

impl serde::Serialize for ObjectView<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let object = &self.data.objects[self.id.0];
        let mut map = serializer.serialize_map(Some(object.fields.len()))?;
        for (key, value) in &object.fields {
            map.serialize_entry(key, &ValueView { data: self.data, value })?;
        }
        map.end()
    }
}

struct ValueView<'a> {
    data: &'a ResponseData,
    value: &'a ResponseValue,
}

impl serde::Serialize for ValueView<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            // Pending slots only survive when their branch was nulled out
            // through an ancestor.
            ResponseValue::Null | ResponseValue::Pending => serializer.serialize_unit(),
            ResponseValue::Leaf(value) => value.serialize(serializer),
            ResponseValue::Object(id) => ObjectView {
                data: self.data,
                id: *id,
            }
            .serialize(serializer),
            ResponseValue::List(id) => {
                let list = &self.data.lists[id.0];
                let mut seq = serializer.serialize_seq(Some(list.items.len()))?;
                for item in &list.items {
                    seq.serialize_element(&ValueView {
                        data: self.data,
                        value: item,
                    })?;
                }
                seq.end()
            }
        }
    }
}
