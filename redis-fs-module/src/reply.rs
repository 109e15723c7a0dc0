//! Reply values, mirroring the host protocol's shapes: simple `OK`,
//! integer, bulk (possibly binary) string, nil, and nested arrays. Flat
//! field maps are arrays of alternating key and value.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Int(i64),
    Bulk(Vec<u8>),
    Nil,
    Array(Vec<Reply>),
}

impl Reply {
    pub fn bulk(data: impl Into<Vec<u8>>) -> Reply {
        Reply::Bulk(data.into())
    }

    /// Alternating key/value pairs flattened into one array.
    pub fn field_map(pairs: Vec<(&'static str, Reply)>) -> Reply {
        let mut flat = Vec::with_capacity(pairs.len() * 2);
        for (name, value) in pairs {
            flat.push(Reply::bulk(name));
            flat.push(value);
        }
        Reply::Array(flat)
    }
}
