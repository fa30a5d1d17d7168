// SPDX-License-Identifier: MIT OR Apache-2.0

/// Macro to run the same test logic against all store backend implementations.
///
/// This macro takes a closure that will be executed against each store type:
/// - In-memory store (`MemoryStore`)
/// - SQLite store (`SqliteStore`)
///
/// ## Example
///
/// ```rust
/// # use roster_store::{HierarchyStore, HierarchyWriter, Unit, UnitKind};
/// # use roster_store::assert_all_stores;
/// # async fn run() {
/// assert_all_stores!(|store| async {
///     let unit = Unit::new("hq:lead", None);
///     assert!(store.insert_unit(UnitKind::Billet, &unit).await.unwrap());
/// });
/// # }
/// ```
#[macro_export]
macro_rules! assert_all_stores {
    (|$store:ident| $test_body:expr) => {
        // Test with MemoryStore.
        {
            let $store = $crate::memory::MemoryStore::default();
            $test_body.await;
        }

        // Test with SqliteStore.
        {
            let $store = $crate::sqlite::SqliteStore::temporary().await;
            $test_body.await;
        }
    };
}

/// Build a hierarchy from `(slug, superior slug)` pairs, parents have to be listed before their
/// subordinates.
///
/// Unit ids are derived from the slugs (`"id:<slug>"`) to keep tests readable.
pub async fn insert_tree<S>(store: &S, kind: crate::UnitKind, tree: &[(&str, Option<&str>)])
where
    S: crate::HierarchyWriter,
    S::Error: std::fmt::Debug,
{
    for (slug, superior) in tree {
        let unit = crate::Unit::new(*slug, superior.map(|superior| format!("id:{superior}").into()))
            .with_id(format!("id:{slug}"));
        assert!(
            store.insert_unit(kind, &unit).await.unwrap(),
            "unit {slug} inserted"
        );
    }
}
