// Service catalog — catalog CRUD plus the category working set.
// Deleting a definition cascades to the assignment ledger.

use rust_decimal::Decimal;

use crate::error::AppError;
use crate::store::Store;
use crate::types::{ServiceCategory, ServiceDefinition};

/// Payload for creating a catalog service.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub default_cost: Decimal,
    pub category: ServiceCategory,
    pub description: Option<String>,
}

fn validate_service(name: &str, default_cost: Decimal) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Service name is required".to_string()));
    }
    if default_cost < Decimal::ZERO {
        return Err(AppError::Validation(
            "Default cost must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Create a catalog service. A custom category not yet in the working set is
/// registered as a side effect.
pub fn add_service(store: &mut Store, new: NewService) -> Result<ServiceDefinition, AppError> {
    validate_service(&new.name, new.default_cost)?;

    if !store.categories.contains(&new.category) {
        store.categories.push(new.category.clone());
    }

    let service = ServiceDefinition {
        id: crate::util::new_id(),
        name: new.name,
        default_cost: new.default_cost,
        category: new.category,
        description: new.description,
    };
    store.services.push(service.clone());
    log::info!("added catalog service {} ({})", service.name, service.id);
    Ok(service)
}

/// Replace the definition matching `def.id`.
pub fn update_service(store: &mut Store, def: ServiceDefinition) -> Result<(), AppError> {
    validate_service(&def.name, def.default_cost)?;

    if !store.categories.contains(&def.category) {
        store.categories.push(def.category.clone());
    }

    match store.services.iter_mut().find(|s| s.id == def.id) {
        Some(existing) => {
            *existing = def;
            Ok(())
        }
        None => Err(AppError::not_found("service", &def.id)),
    }
}

/// Delete a definition and every ledger assignment referencing it.
pub fn delete_service(store: &mut Store, id: &str) -> Result<(), AppError> {
    let before = store.services.len();
    store.services.retain(|s| s.id != id);
    if store.services.len() == before {
        return Err(AppError::not_found("service", id));
    }

    let orphaned = store
        .client_services
        .iter()
        .filter(|a| a.service_id == id)
        .count();
    store.client_services.retain(|a| a.service_id != id);
    if orphaned > 0 {
        log::info!("deleted service {} and {} assignment(s)", id, orphaned);
    }
    Ok(())
}

pub fn get_service<'a>(store: &'a Store, id: &str) -> Option<&'a ServiceDefinition> {
    store.get_service(id)
}

/// Register a custom category. Idempotent for categories already present.
pub fn add_category(store: &mut Store, category: ServiceCategory) {
    if !store.categories.contains(&category) {
        store.categories.push(category);
    }
}

/// Remove a custom category from the working set.
///
/// Fails with `ReferentialConflict` (reporting the blocking count) when any
/// service other than `editing_service_id` still uses the category. The six
/// defaults are never removable.
pub fn remove_category(
    store: &mut Store,
    category: &ServiceCategory,
    editing_service_id: Option<&str>,
) -> Result<(), AppError> {
    if category.is_default() {
        return Err(AppError::Validation(format!(
            "Default category '{}' cannot be removed",
            category
        )));
    }
    if !store.categories.contains(category) {
        return Err(AppError::not_found("category", category.as_str()));
    }

    let blocking = store
        .services
        .iter()
        .filter(|s| s.category == *category && Some(s.id.as_str()) != editing_service_id)
        .count();
    if blocking > 0 {
        return Err(AppError::ReferentialConflict {
            entity: "category",
            blocking,
        });
    }

    store.categories.retain(|c| c != category);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosting_service(name: &str) -> NewService {
        NewService {
            name: name.to_string(),
            default_cost: Decimal::new(1099, 2),
            category: ServiceCategory::Hosting,
            description: None,
        }
    }

    #[test]
    fn test_add_service_generates_id() {
        let mut store = Store::new();
        let service = add_service(&mut store, hosting_service("Basic Hosting")).unwrap();
        assert!(!service.id.is_empty());
        assert_eq!(store.services.len(), 1);
        assert_eq!(get_service(&store, &service.id).unwrap().name, "Basic Hosting");
    }

    #[test]
    fn test_add_service_rejects_bad_input() {
        let mut store = Store::new();
        let err = add_service(&mut store, hosting_service("   ")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut negative = hosting_service("X");
        negative.default_cost = Decimal::new(-1, 0);
        let err = add_service(&mut store, negative).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_add_service_registers_custom_category() {
        let mut store = Store::new();
        let mut new = hosting_service("SEO Audit");
        new.category = ServiceCategory::Custom("seo".to_string());
        add_service(&mut store, new).unwrap();
        assert!(store
            .categories
            .contains(&ServiceCategory::Custom("seo".to_string())));
    }

    #[test]
    fn test_update_service_replaces_record() {
        let mut store = Store::new();
        let mut service = add_service(&mut store, hosting_service("Basic Hosting")).unwrap();
        service.default_cost = Decimal::new(4999, 2);
        update_service(&mut store, service.clone()).unwrap();
        assert_eq!(
            get_service(&store, &service.id).unwrap().default_cost,
            Decimal::new(4999, 2)
        );
    }

    #[test]
    fn test_update_unknown_service_fails() {
        let mut store = Store::new();
        let ghost = ServiceDefinition {
            id: "missing".to_string(),
            name: "Ghost".to_string(),
            default_cost: Decimal::ZERO,
            category: ServiceCategory::Other,
            description: None,
        };
        assert!(matches!(
            update_service(&mut store, ghost),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_service_cascades_to_assignments() {
        let mut store = Store::new();
        let service = add_service(&mut store, hosting_service("Basic Hosting")).unwrap();
        let other = add_service(&mut store, hosting_service("Premium Hosting")).unwrap();
        store.client_services.push(crate::types::ClientServiceAssignment {
            id: "a1".to_string(),
            client_id: "c1".to_string(),
            service_id: service.id.clone(),
            custom_cost: None,
            notes: None,
            domain: None,
            is_active: true,
        });
        store.client_services.push(crate::types::ClientServiceAssignment {
            id: "a2".to_string(),
            client_id: "c2".to_string(),
            service_id: other.id.clone(),
            custom_cost: None,
            notes: None,
            domain: None,
            is_active: true,
        });

        delete_service(&mut store, &service.id).unwrap();

        assert!(get_service(&store, &service.id).is_none());
        assert!(store
            .client_services
            .iter()
            .all(|a| a.service_id != service.id));
        // Unrelated assignments survive
        assert_eq!(store.client_services.len(), 1);
    }

    #[test]
    fn test_remove_category_blocked_by_other_services() {
        let mut store = Store::new();
        let seo = ServiceCategory::Custom("seo".to_string());
        let mut a = hosting_service("Audit");
        a.category = seo.clone();
        let mut b = hosting_service("Link Building");
        b.category = seo.clone();
        let a = add_service(&mut store, a).unwrap();
        add_service(&mut store, b).unwrap();

        // Blocked: one *other* service still uses it
        let err = remove_category(&mut store, &seo, Some(&a.id)).unwrap_err();
        assert!(matches!(
            err,
            AppError::ReferentialConflict { blocking: 1, .. }
        ));
    }

    #[test]
    fn test_remove_category_allowed_when_only_edited_service_uses_it() {
        let mut store = Store::new();
        let seo = ServiceCategory::Custom("seo".to_string());
        let mut new = hosting_service("Audit");
        new.category = seo.clone();
        let service = add_service(&mut store, new).unwrap();

        remove_category(&mut store, &seo, Some(&service.id)).unwrap();
        assert!(!store.categories.contains(&seo));
    }

    #[test]
    fn test_remove_default_category_rejected() {
        let mut store = Store::new();
        let err = remove_category(&mut store, &ServiceCategory::Hosting, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
