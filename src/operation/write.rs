//! WRITE: replaces a RAW payload or updates fields of an OBJECT.
//!
//! For objects the operand is an encoded list of `(name, Value)` pairs. Every
//! update must name an existing mutable field and keep its type; fields that
//! the account and trust standards manage are refused.

use crate::operation::{ExecError, check_size, check_timestamp, commit_object};
use crate::register::object::ObjectError;
use crate::register::state::{RegisterType, State};
use crate::types::encoding::{Decode, Encode};
use crate::types::value::Value;

/// Encodes object field updates into WRITE data.
pub fn updates(fields: &[(&str, Value)]) -> Vec<u8> {
    let owned: Vec<(String, Value)> = fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    Encode::to_vec(&owned)
}

pub fn execute(state: &mut State, data: &[u8], timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    match state.register_type {
        RegisterType::Readonly | RegisterType::Append => Err(ExecError::TypeMismatch("writable")),
        RegisterType::Raw => {
            check_size(data.len())?;
            state.payload = data.to_vec();
            state.modified = timestamp;
            Ok(())
        }
        RegisterType::Object => {
            let fields = Vec::<(String, Value)>::from_bytes(data)
                .map_err(|err| ExecError::MalformedPayload(err.to_string()))?;
            let mut object = state.object()?;
            for (name, value) in fields {
                if object.is_reserved(&name) {
                    return Err(ObjectError::Reserved(name).into());
                }
                object.set(&name, value)?;
            }
            commit_object(state, &object, timestamp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::object::Object;
    use crate::utils::test_utils::utils::{account_state, object_state, raw_state, unique_genesis};

    #[test]
    fn write_replaces_raw_payload() {
        let mut state = raw_state(unique_genesis(), RegisterType::Raw, b"first");
        execute(&mut state, b"second value", 9).unwrap();
        assert_eq!(state.payload, b"second value");
        assert_eq!(state.modified, 9);
    }

    #[test]
    fn write_refuses_readonly_and_append() {
        for register_type in [RegisterType::Readonly, RegisterType::Append] {
            let mut state = raw_state(unique_genesis(), register_type, b"fixed");
            assert_eq!(
                execute(&mut state, b"other", 1),
                Err(ExecError::TypeMismatch("writable"))
            );
            assert_eq!(state.payload, b"fixed");
        }
    }

    #[test]
    fn write_rejects_older_timestamp() {
        let mut state = raw_state(unique_genesis(), RegisterType::Raw, b"data");
        state.modified = 100;
        assert!(matches!(
            execute(&mut state, b"new", 99),
            Err(ExecError::TimestampRegression { timestamp: 99, modified: 100 })
        ));
    }

    // ==== Objects ====

    fn profile() -> Object {
        Object::new()
            .with("created", Value::Uint64(1))
            .with_mutable("name", Value::String("register".into()))
            .with_mutable("level", Value::Uint32(1))
    }

    #[test]
    fn write_updates_mutable_fields() {
        let mut state = object_state(unique_genesis(), &profile());
        let data = updates(&[
            ("name", Value::String("modified".into())),
            ("level", Value::Uint32(2)),
        ]);
        execute(&mut state, &data, 5).unwrap();

        let object = state.object().unwrap();
        assert_eq!(object.get("name"), Some(&Value::String("modified".into())));
        assert_eq!(object.get("level"), Some(&Value::Uint32(2)));
    }

    #[test]
    fn write_refuses_readonly_field_without_partial_update() {
        let mut state = object_state(unique_genesis(), &profile());
        let before = state.clone();
        let data = updates(&[("level", Value::Uint32(7)), ("created", Value::Uint64(2))]);
        assert_eq!(
            execute(&mut state, &data, 5),
            Err(ExecError::Object(ObjectError::Immutable("created".into())))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn write_refuses_changed_length_and_type() {
        let mut state = object_state(unique_genesis(), &profile());
        let data = updates(&[("name", Value::String("longer name".into()))]);
        assert!(matches!(
            execute(&mut state, &data, 5),
            Err(ExecError::Object(ObjectError::LengthMismatch { .. }))
        ));
        let data = updates(&[("level", Value::Uint64(2))]);
        assert!(matches!(
            execute(&mut state, &data, 5),
            Err(ExecError::Object(ObjectError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn write_refuses_reserved_account_fields() {
        let mut state = account_state(unique_genesis(), 10);
        let data = updates(&[("balance", Value::Uint64(1_000_000))]);
        assert_eq!(
            execute(&mut state, &data, 5),
            Err(ExecError::Object(ObjectError::Reserved("balance".into())))
        );
    }

    #[test]
    fn write_rejects_undecodable_updates() {
        let mut state = object_state(unique_genesis(), &profile());
        assert!(matches!(
            execute(&mut state, &[0xFF; 3], 5),
            Err(ExecError::MalformedPayload(_))
        ));
    }
}
