//! Mapping result rows onto entities.

use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::meta::FieldMeta;
use crate::row::{DbRow, RowCursor};
use crate::value::Value;
use std::ops::{Deref, DerefMut};

/// Closes the wrapped cursor when dropped, whatever path the scan leaves by.
struct CloseOnDrop<C: RowCursor>(C);

impl<C: RowCursor> Deref for CloseOnDrop<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: RowCursor> DerefMut for CloseOnDrop<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: RowCursor> Drop for CloseOnDrop<C> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Scan every row of `cursor` into a fresh `T`.
///
/// Each field in `fields` must have a matching result column; a missing column
/// fails the whole scan before any row is read. The cursor is always closed.
pub async fn scan_rows<T, C>(cursor: C, fields: &[FieldMeta]) -> OrmResult<Vec<T>>
where
    T: Entity,
    C: RowCursor,
{
    let mut cursor = CloseOnDrop(cursor);
    let positions = column_positions(cursor.columns(), fields)?;

    let mut out = Vec::new();
    while let Some(row) = cursor.next_row().await? {
        let mut entity = T::default();
        for (meta, &idx) in fields.iter().zip(&positions) {
            assign(&mut entity, meta, row.value(idx)?)?;
        }
        out.push(entity);
    }
    Ok(out)
}

/// Scan a single row into a fresh `T`, matching columns by name.
pub fn scan_row<T, R>(row: &R, fields: &[FieldMeta]) -> OrmResult<T>
where
    T: Entity,
    R: DbRow + ?Sized,
{
    let mut entity = T::default();
    for meta in fields {
        let idx = row
            .position(&meta.column)
            .ok_or_else(|| OrmError::column_mapping(&meta.column))?;
        assign(&mut entity, meta, row.value(idx)?)?;
    }
    Ok(entity)
}

/// Write a RETURNING row back into `entity`. Column `i` of the row feeds
/// `fields[i]`.
pub fn scan_returning<T, R>(entity: &mut T, row: &R, fields: &[FieldMeta]) -> OrmResult<()>
where
    T: Entity,
    R: DbRow + ?Sized,
{
    if let Some(missing) = fields.get(row.len()) {
        return Err(OrmError::column_mapping(&missing.column));
    }
    for (idx, meta) in fields.iter().enumerate() {
        assign(entity, meta, row.value(idx)?)?;
    }
    Ok(())
}

fn column_positions(columns: &[String], fields: &[FieldMeta]) -> OrmResult<Vec<usize>> {
    fields
        .iter()
        .map(|meta| {
            columns
                .iter()
                .position(|c| *c == meta.column)
                .ok_or_else(|| OrmError::column_mapping(&meta.column))
        })
        .collect()
}

fn assign<T: Entity>(entity: &mut T, meta: &FieldMeta, value: Value) -> OrmResult<()> {
    let Some(target) = entity.field_target(meta.ordinal) else {
        panic!(
            "{}: field `{}` (column `{}`) is mapped but has no scan target",
            T::type_name(),
            meta.name,
            meta.column
        );
    };
    target
        .assign(value)
        .map_err(|message| OrmError::decode(&meta.column, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldDescriptor;
    use crate::executor::Executor;
    use crate::memory::{MemoryExecutor, ResultSet};
    use crate::meta::metadata;
    use crate::value::ScanTarget;

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        id: i64,
        email: String,
        nickname: Option<String>,
    }

    impl Entity for Account {
        fn fields() -> &'static [FieldDescriptor] {
            static FIELDS: [FieldDescriptor; 3] = [
                FieldDescriptor::new("id").binding("id,pk,auto"),
                FieldDescriptor::new("email").binding("email"),
                FieldDescriptor::new("nickname").binding("nickname"),
            ];
            &FIELDS
        }

        fn field_value(&self, ordinal: usize) -> Option<Value> {
            match ordinal {
                0 => Some(self.id.into()),
                1 => Some(self.email.clone().into()),
                2 => Some(self.nickname.clone().into()),
                _ => None,
            }
        }

        fn field_target(&mut self, ordinal: usize) -> Option<&mut dyn ScanTarget> {
            match ordinal {
                0 => Some(&mut self.id),
                1 => Some(&mut self.email),
                2 => Some(&mut self.nickname),
                _ => None,
            }
        }
    }

    fn accounts() -> ResultSet {
        ResultSet::new(&["nickname", "id", "email", "extra"])
            .row([Value::Null, 1i64.into(), "a@x.io".into(), 0.into()])
            .row([Value::from("bee"), 2i64.into(), "b@x.io".into(), 0.into()])
    }

    #[tokio::test]
    async fn scans_by_column_name() {
        let db = MemoryExecutor::new();
        db.push_rows(accounts());
        let cursor = db.query_rows("SELECT", &[]).await.unwrap();

        let rows: Vec<Account> = scan_rows(cursor, &metadata::<Account>()).await.unwrap();
        assert_eq!(
            rows,
            [
                Account {
                    id: 1,
                    email: "a@x.io".into(),
                    nickname: None
                },
                Account {
                    id: 2,
                    email: "b@x.io".into(),
                    nickname: Some("bee".into())
                },
            ]
        );
        assert_eq!(db.closed_cursors(), 1);
    }

    #[tokio::test]
    async fn missing_column_aborts_and_closes() {
        let db = MemoryExecutor::new();
        db.push_rows(ResultSet::new(&["id", "email"]).row([Value::I64(1), Value::from("a")]));
        let cursor = db.query_rows("SELECT", &[]).await.unwrap();

        let err = scan_rows::<Account, _>(cursor, &metadata::<Account>())
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::ColumnMapping { ref column } if column == "nickname"));
        assert_eq!(db.closed_cursors(), 1);
    }

    #[tokio::test]
    async fn decode_error_names_column() {
        let db = MemoryExecutor::new();
        db.push_rows(
            ResultSet::new(&["id", "email", "nickname"])
                .row([Value::from("not a number"), "a".into(), Value::Null]),
        );
        let cursor = db.query_rows("SELECT", &[]).await.unwrap();

        let err = scan_rows::<Account, _>(cursor, &metadata::<Account>())
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "id"));
        assert_eq!(db.closed_cursors(), 1);
    }

    #[tokio::test]
    async fn cursor_error_surfaces() {
        let db = MemoryExecutor::new();
        db.push_rows(
            ResultSet::new(&["id", "email", "nickname"])
                .row([Value::I64(1), "a".into(), Value::Null])
                .row([Value::I64(2), "b".into(), Value::Null])
                .fail_after(1, "connection reset"),
        );
        let cursor = db.query_rows("SELECT", &[]).await.unwrap();

        let err = scan_rows::<Account, _>(cursor, &metadata::<Account>())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(db.closed_cursors(), 1);
    }

    #[tokio::test]
    async fn single_row_by_name() {
        let db = MemoryExecutor::new();
        db.push_rows(accounts());
        let row = db.query_row("SELECT", &[]).await.unwrap();
        let account: Account = scan_row(&row, &metadata::<Account>()).unwrap();
        assert_eq!(account.id, 1);
        assert_eq!(account.nickname, None);
    }

    #[tokio::test]
    async fn returning_assigns_by_position() {
        let db = MemoryExecutor::new();
        db.push_rows(ResultSet::new(&["generated"]).row([Value::I64(99)]));
        let row = db.query_row("INSERT", &[]).await.unwrap();

        let auto: Vec<_> = metadata::<Account>()
            .into_iter()
            .filter(|m| m.is_auto)
            .collect();
        let mut account = Account {
            email: "c@x.io".into(),
            ..Default::default()
        };
        scan_returning(&mut account, &row, &auto).unwrap();
        assert_eq!(account.id, 99);
        assert_eq!(account.email, "c@x.io");
    }

    #[tokio::test]
    async fn returning_row_too_short() {
        let db = MemoryExecutor::new();
        db.push_rows(ResultSet::new(&[]).row(Vec::<Value>::new()));
        let row = db.query_row("INSERT", &[]).await.unwrap();

        let mut account = Account::default();
        let err = scan_returning(&mut account, &row, &metadata::<Account>()).unwrap_err();
        assert!(err.is_column_mapping());
    }
}
