//! Registry facade: every operation runs inside exactly one store transaction

use crate::provider;
use crate::query::ListParams;
use crate::read::{node, View};
use crate::resource::Resource;
use fedreg_core::prelude::*;
use fedreg_schema::{Merge, MergePolicy, ProviderCreateExtended, Validate};
use fedreg_store::{Database, Graph};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Federation registry operations over a shared [`Database`]
#[derive(Debug, Clone)]
pub struct Registry {
    db: Arc<Database>,
}

fn render<R: Resource>(graph: &Graph, item: &R, view: View) -> Result<Value> {
    let mut out = node(item, view.private)?;
    if view.extended {
        out.extend(R::connections(graph, item.uid(), view.private)?);
    }
    out.insert("schema_type".to_string(), Value::String(view.schema_type().to_string()));
    Ok(Value::Object(out))
}

impl Registry {
    /// Create a registry over an existing database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Registry backed by a fresh in-memory database
    pub fn in_memory() -> Self {
        Self::new(Arc::new(Database::in_memory()))
    }

    /// Underlying database
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Create a provider and its whole nested tree. Returns the private
    /// extended view of the new provider.
    pub async fn create_provider(&self, input: ProviderCreateExtended) -> Result<Value> {
        input.validate()?;
        self.db
            .write_transaction(|graph| {
                let uid = provider::create(graph, &input)?;
                let item = graph.providers.require(&uid)?;
                render(graph, item, View { private: true, extended: true })
            })
            .await
    }

    /// Replace a provider with the input tree. Returns `None` when nothing
    /// changed.
    pub async fn replace_provider(
        &self,
        uid: &str,
        input: ProviderCreateExtended,
    ) -> Result<Option<Value>> {
        input.validate()?;
        self.db
            .write_transaction(|graph| {
                if !provider::replace(graph, uid, &input)? {
                    return Ok(None);
                }
                let item = graph.providers.require(uid)?;
                render(graph, item, View { private: true, extended: true }).map(Some)
            })
            .await
    }

    /// List nodes of one kind. Filters and sorting only see the attributes
    /// the caller is allowed to read, even under `short`.
    pub fn list<R: Resource>(&self, params: &ListParams, private: bool) -> Result<Value> {
        let view = View {
            private: private && !params.short,
            extended: params.with_conn,
        };
        self.db.read_transaction(|graph| {
            let rows = R::table(graph)
                .values()
                .map(|item| Ok((node(item, private)?, item)))
                .collect::<Result<Vec<(Map<String, Value>, &R)>>>()?;
            let items = params
                .apply(rows)
                .into_iter()
                .map(|item| render(graph, item, view))
                .collect::<Result<Vec<_>>>()?;
            debug!(kind = R::KIND, count = items.len(), "Listed nodes");
            Ok(Value::Array(items))
        })
    }

    /// Read one node
    pub fn get<R: Resource>(&self, uid: &str, view: View) -> Result<Value> {
        self.db.read_transaction(|graph| {
            let item = graph.require::<R>(uid)?;
            render(graph, item, view)
        })
    }

    /// Apply a partial attribute update. Returns `None` when nothing changed.
    pub async fn patch<R>(&self, uid: &str, update: R::Update) -> Result<Option<Value>>
    where
        R: Resource + Merge<<R as Resource>::Update>,
    {
        update.validate()?;
        self.db
            .write_transaction(|graph| {
                R::check_update(graph, uid, &update)?;
                let changed = R::table_mut(graph)
                    .require_mut(uid)?
                    .merge(&update, MergePolicy::PartialMerge);
                if !changed {
                    debug!(kind = R::KIND, uid, "Nothing to update");
                    return Ok(None);
                }
                info!(kind = R::KIND, uid, "Updated node");
                let item = graph.require::<R>(uid)?;
                render(graph, item, View { private: true, extended: false }).map(Some)
            })
            .await
    }

    /// Delete a node and what it owns
    pub async fn delete<R: Resource>(&self, uid: &str) -> Result<()> {
        self.db
            .write_transaction(|graph| {
                graph.require::<R>(uid)?;
                R::remove(graph, uid)?;
                info!(kind = R::KIND, uid, "Deleted node");
                Ok(())
            })
            .await
    }

    /// Liveness information with node counters
    pub fn status(&self) -> Value {
        json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "backend": self.db.backend_name(),
            "nodes": self.db.counts(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedreg_schema::ProviderUpdate;
    use serde_json::from_value;

    fn provider_input(name: &str) -> ProviderCreateExtended {
        from_value(json!({
            "name": name,
            "type": "openstack",
            "support_emails": ["ops@example.org"],
            "projects": [{"name": "proj", "uuid": "u1"}],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_provider() {
        let registry = Registry::in_memory();
        let created = registry.create_provider(provider_input("cloud")).await.unwrap();
        assert_eq!(created["schema_type"], "private_extended");
        assert_eq!(created["projects"][0]["uuid"], "u1");

        let uid = created["uid"].as_str().unwrap();
        let public = registry
            .get::<Provider>(uid, View { private: false, extended: false })
            .unwrap();
        assert_eq!(public["name"], "cloud");
        assert!(public.get("support_emails").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_provider_rejected() {
        let registry = Registry::in_memory();
        registry.create_provider(provider_input("cloud")).await.unwrap();
        let err = registry.create_provider(provider_input("cloud")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(registry.database().counts()["providers"], 1);
    }

    #[tokio::test]
    async fn test_patch_unchanged_returns_none() {
        let registry = Registry::in_memory();
        let created = registry.create_provider(provider_input("cloud")).await.unwrap();
        let uid = created["uid"].as_str().unwrap();

        let update = ProviderUpdate {
            name: Some("cloud".to_string()),
            ..Default::default()
        };
        assert!(registry.patch::<Provider>(uid, update).await.unwrap().is_none());

        let update = ProviderUpdate {
            is_public: Some(true),
            ..Default::default()
        };
        let patched = registry.patch::<Provider>(uid, update).await.unwrap().unwrap();
        assert_eq!(patched["is_public"], true);
    }

    #[tokio::test]
    async fn test_list_filters_and_views() {
        let registry = Registry::in_memory();
        registry.create_provider(provider_input("alpha")).await.unwrap();
        registry.create_provider(provider_input("beta")).await.unwrap();

        let params = ListParams {
            sort: Some("-name".to_string()),
            ..Default::default()
        };
        let list = registry.list::<Provider>(&params, true).unwrap();
        assert_eq!(list[0]["name"], "beta");
        assert_eq!(list[0]["schema_type"], "private");

        let params = ListParams {
            filters: vec![("name".to_string(), "alpha".to_string())],
            with_conn: true,
            ..Default::default()
        };
        let list = registry.list::<Provider>(&params, false).unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["schema_type"], "public_extended");
        assert_eq!(list[0]["projects"][0]["uuid"], "u1");
    }

    #[tokio::test]
    async fn test_anonymous_list_cannot_filter_on_private_attributes() {
        let registry = Registry::in_memory();
        registry.create_provider(provider_input("alpha")).await.unwrap();
        registry.create_provider(provider_input("beta")).await.unwrap();

        let params = ListParams {
            filters: vec![("status".to_string(), "active".to_string())],
            ..Default::default()
        };
        let private = registry.list::<Provider>(&params, true).unwrap();
        assert_eq!(private.as_array().unwrap().len(), 2);

        let public = registry.list::<Provider>(&params, false).unwrap();
        assert_eq!(public, json!([]));

        let params = ListParams {
            filters: vec![("name".to_string(), "beta".to_string())],
            short: true,
            ..Default::default()
        };
        let short = registry.list::<Provider>(&params, true).unwrap();
        assert_eq!(short[0]["schema_type"], "public");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let registry = Registry::in_memory();
        let err = registry.delete::<Region>("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_counts() {
        let registry = Registry::in_memory();
        registry.create_provider(provider_input("cloud")).await.unwrap();
        let status = registry.status();
        assert_eq!(status["status"], "ok");
        assert_eq!(status["nodes"]["projects"], 1);
    }
}
