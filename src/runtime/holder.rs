//! External state holders.
//!
//! A machine never owns its state. It reads and writes one named field of a
//! holder through [`StateHolder`]. Keyed records (maps, JSON objects) get
//! implementations here; structs implement the trait over their own fields.

use super::error::HolderError;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Read/write access to a named state field.
///
/// `read_state` returns `Ok(None)` for an unset field. Values written are
/// always state names.
///
/// # Example
///
/// ```rust
/// use sluice::runtime::{HolderError, StateHolder};
///
/// struct Order {
///     status: Option<String>,
///     payment: Option<String>,
/// }
///
/// impl StateHolder for Order {
///     fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
///         match field {
///             "status" => Ok(self.status.clone()),
///             "payment" => Ok(self.payment.clone()),
///             other => Err(HolderError::MissingField(other.to_string())),
///         }
///     }
///
///     fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
///         let slot = match field {
///             "status" => &mut self.status,
///             "payment" => &mut self.payment,
///             other => return Err(HolderError::MissingField(other.to_string())),
///         };
///         *slot = Some(value.to_string());
///         Ok(())
///     }
/// }
/// ```
pub trait StateHolder {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError>;

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError>;
}

impl<S: BuildHasher> StateHolder for HashMap<String, Option<String>, S> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        Ok(self.get(field).cloned().flatten())
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.insert(field.to_string(), Some(value.to_string()));
        Ok(())
    }
}

impl<S: BuildHasher> StateHolder for HashMap<String, String, S> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        Ok(self.get(field).cloned())
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.insert(field.to_string(), value.to_string());
        Ok(())
    }
}

impl StateHolder for BTreeMap<String, Option<String>> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        Ok(self.get(field).cloned().flatten())
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.insert(field.to_string(), Some(value.to_string()));
        Ok(())
    }
}

impl StateHolder for BTreeMap<String, String> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        Ok(self.get(field).cloned())
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.insert(field.to_string(), value.to_string());
        Ok(())
    }
}

impl StateHolder for Map<String, Value> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(HolderError::NotAString {
                field: field.to_string(),
                value: other.clone(),
            }),
        }
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.insert(field.to_string(), Value::String(value.to_string()));
        Ok(())
    }
}

impl StateHolder for Value {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        self.as_object()
            .ok_or(HolderError::NotAnObject)?
            .read_state(field)
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.as_object_mut()
            .ok_or(HolderError::NotAnObject)?
            .write_state(field, value)
    }
}

impl<H: StateHolder + ?Sized> StateHolder for &mut H {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        (**self).read_state(field)
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        (**self).write_state(field, value)
    }
}

impl<H: StateHolder + ?Sized> StateHolder for Box<H> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        (**self).read_state(field)
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        (**self).write_state(field, value)
    }
}

// Shared handles borrow only for the duration of one read or write, so
// several machines (and running actions) can reach the same holder.

impl<H: StateHolder> StateHolder for &RefCell<H> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        self.try_borrow()
            .map_err(|_| HolderError::Borrowed)?
            .read_state(field)
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.try_borrow_mut()
            .map_err(|_| HolderError::Borrowed)?
            .write_state(field, value)
    }
}

impl<H: StateHolder> StateHolder for Rc<RefCell<H>> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        self.try_borrow()
            .map_err(|_| HolderError::Borrowed)?
            .read_state(field)
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.try_borrow_mut()
            .map_err(|_| HolderError::Borrowed)?
            .write_state(field, value)
    }
}

impl<H: StateHolder> StateHolder for Arc<Mutex<H>> {
    fn read_state(&self, field: &str) -> Result<Option<String>, HolderError> {
        self.lock()
            .map_err(|_| HolderError::Poisoned)?
            .read_state(field)
    }

    fn write_state(&mut self, field: &str, value: &str) -> Result<(), HolderError> {
        self.lock()
            .map_err(|_| HolderError::Poisoned)?
            .write_state(field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_map_treats_missing_and_none_as_unset() {
        let mut map: HashMap<String, Option<String>> = HashMap::new();
        assert_eq!(map.read_state("state"), Ok(None));

        map.insert("state".to_string(), None);
        assert_eq!(map.read_state("state"), Ok(None));

        map.write_state("state", "BETA").unwrap();
        assert_eq!(map.read_state("state"), Ok(Some("BETA".to_string())));
        assert_eq!(map.get("state"), Some(&Some("BETA".to_string())));
    }

    #[test]
    fn btree_map_round_trips() {
        let mut map: BTreeMap<String, Option<String>> = BTreeMap::new();
        map.write_state("phase", "ALPHA").unwrap();
        assert_eq!(map.read_state("phase"), Ok(Some("ALPHA".to_string())));
        assert_eq!(map.read_state("other"), Ok(None));
    }

    #[test]
    fn plain_string_maps_treat_missing_as_unset() {
        let mut hashed: HashMap<String, String> = HashMap::new();
        let mut ordered: BTreeMap<String, String> = BTreeMap::new();
        assert_eq!(hashed.read_state("state"), Ok(None));
        assert_eq!(ordered.read_state("state"), Ok(None));

        hashed.write_state("state", "BETA").unwrap();
        ordered.write_state("state", "BETA").unwrap();
        assert_eq!(hashed.read_state("state"), Ok(Some("BETA".to_string())));
        assert_eq!(ordered.get("state").map(String::as_str), Some("BETA"));
    }

    #[test]
    fn json_object_reads_strings_only() {
        let mut record = json!({ "state": null, "count": 3 });
        assert_eq!(record.read_state("state"), Ok(None));
        assert_eq!(record.read_state("missing"), Ok(None));
        assert!(matches!(
            record.read_state("count"),
            Err(HolderError::NotAString { field, .. }) if field == "count"
        ));

        record.write_state("state", "GAMMA").unwrap();
        assert_eq!(record["state"], json!("GAMMA"));
    }

    #[test]
    fn json_non_object_is_rejected() {
        let mut record = json!(["not", "an", "object"]);
        assert_eq!(record.read_state("state"), Err(HolderError::NotAnObject));
        assert_eq!(
            record.write_state("state", "ALPHA"),
            Err(HolderError::NotAnObject)
        );
    }

    #[test]
    fn shared_handles_see_each_others_writes() {
        let shared = Rc::new(RefCell::new(HashMap::<String, String>::new()));
        let mut first = Rc::clone(&shared);
        let second = Rc::clone(&shared);

        first.write_state("state", "BETA").unwrap();
        assert_eq!(second.read_state("state"), Ok(Some("BETA".to_string())));
    }

    #[test]
    fn borrowed_refcell_is_reported() {
        let cell = RefCell::new(HashMap::<String, String>::new());
        let _guard = cell.borrow_mut();
        let handle = &cell;
        assert_eq!(handle.read_state("state"), Err(HolderError::Borrowed));
    }

    #[test]
    fn mutex_handle_round_trips() {
        let mut shared = Arc::new(Mutex::new(json!({})));
        shared.write_state("state", "ALPHA").unwrap();
        assert_eq!(shared.read_state("state"), Ok(Some("ALPHA".to_string())));
    }
}
