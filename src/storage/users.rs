use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{normalize_email, ProfilePatch, User};
use super::tables::*;

const EMAIL_INDEX: &str = "user_emails";

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a new user.
    ///
    /// The email index is checked and written in the same write transaction as
    /// the user record. redb admits one writer at a time, so two concurrent
    /// inserts for the same email cannot both commit: the later one fails with
    /// [`DatabaseError::UniqueViolation`].
    pub fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        debug_assert!(!user.id.is_empty(), "user id must not be empty");
        debug_assert!(!user.email.trim().is_empty(), "user email must not be empty");

        let email_key = normalize_email(&user.email);
        let write_txn = self.begin_write()?;
        {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(email_key.as_str())?.is_some() {
                return Err(DatabaseError::UniqueViolation { index: EMAIL_INDEX });
            }
            emails.insert(email_key.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            users.insert(user.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => {
                let user: User = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Case-insensitive lookup through the email index
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let users = read_txn.open_table(USERS)?;

        let user_id: Option<String> = emails
            .get(normalize_email(email).as_str())?
            .map(|v| v.value().to_string());

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        match users.get(user_id.as_str())? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Apply the fields present in `patch` to a user.
    ///
    /// Returns `Ok(None)` if the user does not exist. An email already indexed
    /// for a different user fails with [`DatabaseError::UniqueViolation`] and
    /// nothing is written.
    pub fn update_user_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<User>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let updated = {
            let mut users = write_txn.open_table(USERS)?;
            let existing: Option<User> = match users.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            let Some(mut user) = existing else {
                return Ok(None);
            };

            if let Some(email) = patch.email.as_deref() {
                let old_key = normalize_email(&user.email);
                let new_key = normalize_email(email);

                if new_key != old_key {
                    let mut emails = write_txn.open_table(USER_EMAILS)?;
                    let owner: Option<String> = emails
                        .get(new_key.as_str())?
                        .map(|v| v.value().to_string());

                    if owner.is_some_and(|owner| owner != user.id) {
                        return Err(DatabaseError::UniqueViolation { index: EMAIL_INDEX });
                    }

                    emails.remove(old_key.as_str())?;
                    emails.insert(new_key.as_str(), user.id.as_str())?;
                }
                user.email = email.trim().to_string();
            }

            if let Some(name) = patch.name.as_deref() {
                user.name = name.trim().to_string();
            }
            if let Some(phone) = patch.phone.as_deref() {
                user.phone = non_empty(phone);
            }
            if let Some(image) = patch.profile_image.as_deref() {
                user.profile_image = non_empty(image);
            }
            user.updated_at = Utc::now();

            let data = rmp_serde::to_vec_named(&user)?;
            users.insert(id, data.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    /// Get all users
    pub fn get_all_users(&self) -> Result<Vec<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut users = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let user: User = rmp_serde::from_slice(value.value())?;
            users.push(user);
        }

        Ok(users)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::testutil::{make_user, setup_db};

    #[test]
    fn test_create_and_find_user_case_insensitive() {
        let (db, _temp) = setup_db();

        let user = make_user("u1", "Ann@X.com");
        db.create_user(&user).unwrap();

        let found = db.find_user_by_email("ann@x.com").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.email, "Ann@X.com");

        assert!(db.find_user_by_email("  ANN@x.COM ").unwrap().is_some());
        assert!(db.find_user_by_email("bob@x.com").unwrap().is_none());
        assert_eq!(db.get_user("u1").unwrap().unwrap().name, "User u1");
    }

    #[test]
    fn test_duplicate_email_is_rejected_by_store() {
        let (db, _temp) = setup_db();

        db.create_user(&make_user("u1", "ann@x.com")).unwrap();
        let err = db.create_user(&make_user("u2", "ANN@x.com")).unwrap_err();

        assert!(matches!(err, DatabaseError::UniqueViolation { .. }));
        assert!(db.get_user("u2").unwrap().is_none());
        assert_eq!(db.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_creates_with_same_email() {
        let (db, _temp) = setup_db();
        let db = Arc::new(db);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = Arc::clone(&db);
                thread::spawn(move || db.create_user(&make_user(&format!("u{i}"), "race@x.com")))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DatabaseError::UniqueViolation { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(db.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn test_update_profile_only_touches_present_fields() {
        let (db, _temp) = setup_db();

        let mut user = make_user("u1", "ann@x.com");
        user.profile_image = Some("file:///ann.jpg".to_string());
        db.create_user(&user).unwrap();

        let patch = ProfilePatch {
            phone: Some("555-1234".to_string()),
            ..Default::default()
        };
        let updated = db.update_user_profile("u1", &patch).unwrap().unwrap();

        assert_eq!(updated.phone.as_deref(), Some("555-1234"));
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.profile_image, user.profile_image);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[test]
    fn test_update_profile_empty_optional_clears() {
        let (db, _temp) = setup_db();

        let mut user = make_user("u1", "ann@x.com");
        user.phone = Some("555-0000".to_string());
        db.create_user(&user).unwrap();

        let patch = ProfilePatch {
            phone: Some(String::new()),
            ..Default::default()
        };
        let updated = db.update_user_profile("u1", &patch).unwrap().unwrap();
        assert!(updated.phone.is_none());
    }

    #[test]
    fn test_update_profile_email_moves_index() {
        let (db, _temp) = setup_db();
        db.create_user(&make_user("u1", "ann@x.com")).unwrap();

        let patch = ProfilePatch {
            email: Some("anne@y.com".to_string()),
            ..Default::default()
        };
        db.update_user_profile("u1", &patch).unwrap().unwrap();

        assert!(db.find_user_by_email("ann@x.com").unwrap().is_none());
        assert_eq!(db.find_user_by_email("ANNE@y.com").unwrap().unwrap().id, "u1");

        // The old address is free again
        db.create_user(&make_user("u2", "ann@x.com")).unwrap();
    }

    #[test]
    fn test_update_profile_email_conflict_writes_nothing() {
        let (db, _temp) = setup_db();
        db.create_user(&make_user("u1", "ann@x.com")).unwrap();
        db.create_user(&make_user("u2", "bob@x.com")).unwrap();

        let patch = ProfilePatch {
            email: Some("Bob@X.com".to_string()),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let err = db.update_user_profile("u1", &patch).unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation { .. }));

        let unchanged = db.get_user("u1").unwrap().unwrap();
        assert_eq!(unchanged.email, "ann@x.com");
        assert_eq!(unchanged.name, "User u1");
        assert_eq!(db.find_user_by_email("bob@x.com").unwrap().unwrap().id, "u2");
    }

    #[test]
    fn test_update_profile_own_email_case_change() {
        let (db, _temp) = setup_db();
        db.create_user(&make_user("u1", "ann@x.com")).unwrap();

        let patch = ProfilePatch {
            email: Some("Ann@X.com".to_string()),
            ..Default::default()
        };
        let updated = db.update_user_profile("u1", &patch).unwrap().unwrap();
        assert_eq!(updated.email, "Ann@X.com");
        assert_eq!(db.find_user_by_email("ann@x.com").unwrap().unwrap().id, "u1");
    }

    #[test]
    fn test_update_missing_user_returns_none() {
        let (db, _temp) = setup_db();
        let patch = ProfilePatch {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        assert!(db.update_user_profile("nope", &patch).unwrap().is_none());
    }
}
