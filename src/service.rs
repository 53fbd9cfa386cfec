//! Generic CRUD lifecycle service
//!
//! [`CrudService`] implements list, get-by-id, create, update, delete and
//! delete-many uniformly over any entity type, against a caller-supplied
//! [`Repository`] capability. Every operation follows a fixed sequence of
//! extension points; the hooks are overridable no-ops, and overriding them
//! is the sole customization mechanism.
//!
//! The service holds no shared mutable state: instance-level state is the
//! immutable [`ServiceConfig`] and the repository handle, so concurrent
//! invocations are independent. No retry, timeout or transactional
//! discipline is imposed here; the surrounding transport or transaction
//! layer must supply those guarantees where needed.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::query::{Queryable, Repository, apply_fetch_specification, strip_omitted_fields};
use crate::spec::FetchSpecification;

/// Generic CRUD orchestrator over a [`Repository`] capability
///
/// Implementors provide `repository()` and `config()`; everything else has
/// a default body. The default `set_data_create`/`set_data_update` mappers
/// perform a shallow property merge through serde round-trips with no type
/// coercion or field whitelisting; override them (or validate in the
/// `validate_before_*` hooks) when stricter construction is needed.
///
/// `find_all`, `find_all_raw` and `get_by_id` return `serde_json::Value`
/// result objects rather than typed entities because `omit_fields` produces
/// partial shapes. `create` and `update` return the typed entity.
///
/// The post-action hooks (`action_after_create`, `action_after_update`) are
/// dispatched onto the ambient Tokio runtime and not awaited: the
/// operation's result is returned without waiting for them, and a failing
/// post-action hook is logged, never surfaced to the caller.
pub trait CrudService: Send + Sync {
    type Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    type Create: Serialize + Send + Sync + 'static;
    type Update: Serialize + Send + Sync + 'static;
    type Repo: Repository<Self::Entity>;

    fn repository(&self) -> &Self::Repo;

    fn config(&self) -> &ServiceConfig;

    // =========================================================================
    // Data mappers (shallow merge by default, usually overridden)
    // =========================================================================

    /// Build a fresh entity from creation input
    fn set_data_create(&self, create: &Self::Create) -> Result<Self::Entity> {
        Ok(serde_json::from_value(serde_json::to_value(create)?)?)
    }

    /// Merge update input onto an existing entity
    fn set_data_update(&self, model: Self::Entity, update: &Self::Update) -> Result<Self::Entity> {
        let mut base = serde_json::to_value(&model)?;
        let patch = serde_json::to_value(update)?;
        if let (Some(base_map), Some(patch_map)) = (base.as_object_mut(), patch.as_object()) {
            for (key, value) in patch_map {
                base_map.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(base)?)
    }

    // =========================================================================
    // Query extension hooks (no-ops by default)
    // =========================================================================

    /// Extend the list query; receives the caller's opaque filter payload
    fn set_filters(
        &self,
        _query: &mut <Self::Repo as Repository<Self::Entity>>::Query,
        _filters: Option<&serde_json::Value>,
    ) {
    }

    fn set_filters_get_by_id(&self, _query: &mut <Self::Repo as Repository<Self::Entity>>::Query) {}

    fn set_filters_update(&self, _query: &mut <Self::Repo as Repository<Self::Entity>>::Query) {}

    fn set_filters_delete(&self, _query: &mut <Self::Repo as Repository<Self::Entity>>::Query) {}

    // =========================================================================
    // Lifecycle hooks (awaited; no-ops by default)
    // =========================================================================

    fn validate_before_create(
        &self,
        _create: &Self::Create,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    fn validate_before_update(
        &self,
        _id: &str,
        _update: &Self::Update,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    fn action_before_update(
        &self,
        _id: &str,
        _update: &Self::Update,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Transform the list result set before omitted fields are stripped
    fn extend_find_all_results(
        &self,
        items: Vec<Self::Entity>,
    ) -> impl Future<Output = Result<Vec<Self::Entity>>> + Send {
        async { Ok(items) }
    }

    /// Transform a fetched entity before omitted fields are stripped
    fn extend_get_by_id_result(
        &self,
        model: Self::Entity,
    ) -> impl Future<Output = Result<Self::Entity>> + Send {
        async { Ok(model) }
    }

    /// Authorization predicate consulted before removal
    fn can_be_removed(&self, _id: &str, _model: &Self::Entity) -> bool {
        true
    }

    // =========================================================================
    // Post-action hooks (fire-and-forget; never awaited, never surfaced)
    // =========================================================================

    /// Runs after a created entity is persisted
    ///
    /// The returned future is spawned as a detached task, so overriding
    /// implementations must be `'static`: clone whatever they need out of
    /// `self`. Callers must not assume the hook has completed when `create`
    /// returns.
    fn action_after_create(
        &self,
        _model: Self::Entity,
        _create: Self::Create,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        std::future::ready(Ok(()))
    }

    /// Runs after an updated entity is persisted; same contract as
    /// [`CrudService::action_after_create`]
    fn action_after_update(
        &self,
        _model: Self::Entity,
        _update: Self::Update,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        std::future::ready(Ok(()))
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// List entities matching the specification; returns `(items, total)`
    ///
    /// The total count disregards the pagination window.
    fn find_all(
        &self,
        spec: &FetchSpecification,
        filters: Option<&serde_json::Value>,
    ) -> impl Future<Output = Result<(Vec<serde_json::Value>, i64)>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, "finding all");

            let mut query = self.repository().create_query(&config.alias);
            self.set_filters(&mut query, filters);
            apply_fetch_specification(&mut query, &config.alias, spec);

            let (entities, total) = self.repository().fetch_many_and_count(query).await?;
            let entities = self.extend_find_all_results(entities).await?;
            let items = entities
                .into_iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((strip_omitted_fields(items, &spec.omit_fields), total))
        }
    }

    /// Variant of [`CrudService::find_all`] for non-entity or aggregate
    /// queries: fetches without a count query and reports the result length
    /// as the total
    fn find_all_raw(
        &self,
        spec: &FetchSpecification,
        filters: Option<&serde_json::Value>,
    ) -> impl Future<Output = Result<(Vec<serde_json::Value>, i64)>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, "finding all as raw results");

            let mut query = self.repository().create_query(&config.alias);
            self.set_filters(&mut query, filters);
            apply_fetch_specification(&mut query, &config.alias, spec);

            let entities = self.repository().fetch_many(query).await?;
            let total = entities.len() as i64;
            let entities = self.extend_find_all_results(entities).await?;
            let items = entities
                .into_iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((strip_omitted_fields(items, &spec.omit_fields), total))
        }
    }

    /// Fetch a single entity by identifier
    ///
    /// Applies the specification's fields, includes and filters (pagination
    /// and sorting are not applicable to a single-row fetch).
    fn get_by_id(
        &self,
        id: &str,
        spec: &FetchSpecification,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, id, "getting by id");

            let mut query = self.repository().create_query(&config.alias);
            self.set_filters_get_by_id(&mut query);
            query.where_eq(
                &format!("{}.{}", config.alias, config.id_column),
                serde_json::Value::String(id.to_string()),
            );

            let facets = FetchSpecification {
                disable_pagination: true,
                sort: Vec::new(),
                ..spec.clone()
            };
            apply_fetch_specification(&mut query, &config.alias, &facets);

            let model = self
                .repository()
                .fetch_one(query)
                .await?
                .ok_or_else(|| Error::not_found(format!("{} not found.", config.alias)))?;
            let model = self.extend_get_by_id_result(model).await?;

            let mut items =
                strip_omitted_fields(vec![serde_json::to_value(model)?], &spec.omit_fields);
            Ok(items.pop().unwrap_or(serde_json::Value::Null))
        }
    }

    /// Create and persist a new entity
    ///
    /// Only persistence failure rejects; a failing `action_after_create`
    /// hook is logged and does not block returning the created entity.
    fn create(&self, create: Self::Create) -> impl Future<Output = Result<Self::Entity>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, "creating");

            self.validate_before_create(&create).await?;
            let model = self.set_data_create(&create)?;
            let saved = self.repository().save(model).await?;

            let after = self.action_after_create(saved.clone(), create);
            tokio::spawn(async move {
                if let Err(error) = after.await {
                    warn!(%error, "action_after_create hook failed");
                }
            });

            Ok(saved)
        }
    }

    /// Update an existing entity by identifier
    fn update(
        &self,
        id: &str,
        update: Self::Update,
    ) -> impl Future<Output = Result<Self::Entity>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, id, "updating");

            self.action_before_update(id, &update).await?;
            self.validate_before_update(id, &update).await?;

            let mut query = self.repository().create_query(&config.alias);
            self.set_filters_update(&mut query);
            query.where_eq(
                &format!("{}.{}", config.alias, config.id_column),
                serde_json::Value::String(id.to_string()),
            );

            let model = self
                .repository()
                .fetch_one(query)
                .await?
                .ok_or_else(|| Error::not_found(format!("{} not found.", config.alias)))?;
            let model = self.set_data_update(model, &update)?;
            let saved = self.repository().save(model).await?;

            let after = self.action_after_update(saved.clone(), update);
            tokio::spawn(async move {
                if let Err(error) = after.await {
                    warn!(%error, "action_after_update hook failed");
                }
            });

            Ok(saved)
        }
    }

    /// Remove an entity by identifier
    ///
    /// Fails with [`Error::NotFound`] when no entity matches and with
    /// [`Error::Forbidden`] when [`CrudService::can_be_removed`] rejects;
    /// no mutation occurs in either case.
    fn remove(&self, id: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, id, "removing");

            let mut query = self.repository().create_query(&config.alias);
            self.set_filters_delete(&mut query);
            query.where_eq(
                &format!("{}.{}", config.alias, config.id_column),
                serde_json::Value::String(id.to_string()),
            );

            let model = self
                .repository()
                .fetch_one(query)
                .await?
                .ok_or_else(|| Error::not_found(format!("{} not found.", config.alias)))?;

            if !self.can_be_removed(id, &model) {
                return Err(Error::forbidden(format!(
                    "No suitable permissions to delete this {}.",
                    config.alias
                )));
            }

            self.repository().remove(vec![model]).await
        }
    }

    /// Remove every entity whose identifier is in the given set
    ///
    /// Identifiers that match nothing are silently skipped; when the set
    /// resolves to zero entities no removal call is issued.
    fn remove_many(&self, ids: &[String]) -> impl Future<Output = Result<()>> + Send {
        async move {
            let config = self.config();
            debug!(alias = %config.alias, count = ids.len(), "removing many");

            if ids.is_empty() {
                return Ok(());
            }

            let mut query = self.repository().create_query(&config.alias);
            query.where_in(
                &format!("{}.{}", config.alias, config.id_column),
                ids.iter()
                    .map(|id| serde_json::Value::String(id.clone()))
                    .collect(),
            );

            let found = self.repository().fetch_many(query).await?;
            if !found.is_empty() {
                self.repository().remove(found).await?;
            }
            Ok(())
        }
    }
}
