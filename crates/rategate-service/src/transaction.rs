//! Transaction scoping for business-logic operations.
//!
//! A business operation either joins the transaction its caller already
//! holds, or opens its own and guarantees it is released: committed when the
//! operation succeeds, rolled back when it fails.

use std::future::Future;

/// Begins and releases transactions of some backing resource.
pub trait Transactor {
    /// Open transaction handle.
    type Tx: Send;
    type Error: std::fmt::Display;

    fn begin(&self) -> impl Future<Output = Result<Self::Tx, Self::Error>> + Send;

    fn commit(&self, tx: Self::Tx) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn rollback(&self, tx: Self::Tx) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Runs `f` inside a transaction.
///
/// With `active = Some(tx)`, `f` joins that transaction and its release is
/// left to whoever opened it. Otherwise a new transaction is begun, then
/// committed if `f` returns `Ok` or rolled back if it returns `Err`. A failed
/// rollback is logged and the error from `f` is returned.
pub async fn exec_trans<T, R, F>(
    transactor: &T,
    active: Option<&mut T::Tx>,
    f: F,
) -> Result<R, T::Error>
where
    T: Transactor,
    F: AsyncFnOnce(&mut T::Tx) -> Result<R, T::Error>,
{
    if let Some(tx) = active {
        return f(tx).await;
    }

    let mut tx = transactor.begin().await?;
    match f(&mut tx).await {
        Ok(value) => {
            transactor.commit(tx).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = transactor.rollback(tx).await {
                tracing::warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records lifecycle calls. Each transaction is a list of statements.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        next_id: Mutex<u32>,
        fail_commit: bool,
        fail_rollback: bool,
    }

    struct Tx {
        id: u32,
        statements: Vec<&'static str>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl Transactor for Recorder {
        type Tx = Tx;
        type Error = String;

        async fn begin(&self) -> Result<Tx, String> {
            let mut next = self.next_id.lock();
            *next += 1;
            self.events.lock().push(format!("begin {next}"));
            Ok(Tx {
                id: *next,
                statements: Vec::new(),
            })
        }

        async fn commit(&self, tx: Tx) -> Result<(), String> {
            if self.fail_commit {
                return Err("commit refused".to_owned());
            }
            self.events
                .lock()
                .push(format!("commit {} {:?}", tx.id, tx.statements));
            Ok(())
        }

        async fn rollback(&self, tx: Tx) -> Result<(), String> {
            if self.fail_rollback {
                return Err("connection lost".to_owned());
            }
            self.events.lock().push(format!("rollback {}", tx.id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let db = Recorder::default();
        let out = exec_trans(&db, None, async |tx: &mut Tx| {
            tx.statements.push("insert user");
            Ok::<_, String>(7)
        })
        .await;

        assert_eq!(out, Ok(7));
        assert_eq!(db.events(), ["begin 1", "commit 1 [\"insert user\"]"]);
    }

    #[tokio::test]
    async fn rolls_back_on_failure() {
        let db = Recorder::default();
        let out: Result<(), String> = exec_trans(&db, None, async |tx: &mut Tx| {
            tx.statements.push("insert user");
            Err("duplicate name".to_owned())
        })
        .await;

        assert_eq!(out, Err("duplicate name".to_owned()));
        assert_eq!(db.events(), ["begin 1", "rollback 1"]);
    }

    #[tokio::test]
    async fn joins_active_transaction() {
        let db = Recorder::default();
        let mut outer = db.begin().await.unwrap();

        exec_trans(&db, Some(&mut outer), async |tx: &mut Tx| {
            tx.statements.push("insert role");
            Ok::<_, String>(())
        })
        .await
        .unwrap();

        // Nothing begun or released by the inner call.
        assert_eq!(db.events(), ["begin 1"]);
        assert_eq!(outer.statements, ["insert role"]);

        db.commit(outer).await.unwrap();
        assert_eq!(db.events(), ["begin 1", "commit 1 [\"insert role\"]"]);
    }

    #[tokio::test]
    async fn commit_failure_is_returned() {
        let db = Recorder {
            fail_commit: true,
            ..Recorder::default()
        };
        let out = exec_trans(&db, None, async |_tx: &mut Tx| Ok::<_, String>(())).await;
        assert_eq!(out, Err("commit refused".to_owned()));
    }

    #[tokio::test]
    async fn rollback_failure_keeps_original_error() {
        let db = Recorder {
            fail_rollback: true,
            ..Recorder::default()
        };
        let out: Result<(), String> = exec_trans(&db, None, async |_tx: &mut Tx| {
            Err("duplicate name".to_owned())
        })
        .await;

        assert_eq!(out, Err("duplicate name".to_owned()));
        assert_eq!(db.events(), ["begin 1"]);
    }
}
