#[cfg(test)]
mod tests {
    use super::super::todo_item_service::{ListFilter, TodoItemService, TodoItemServiceImpl};
    use crate::domain::{repository::TodoItemRepository, todo_item::{descriptions_match, TodoItem, TodoItemId}};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct InMemoryRepo {
        items: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<TodoItemId, TodoItem>>>,
        fail_writes: std::sync::Arc<AtomicBool>,
        fail_reads: std::sync::Arc<AtomicBool>,
    }

    impl InMemoryRepo {
        fn check_read(&self) -> Result<()> {
            if self.fail_reads.load(Ordering::SeqCst) { bail!("store unavailable") }
            Ok(())
        }
    }

    #[async_trait]
    impl TodoItemRepository for InMemoryRepo {
        async fn init(&self) -> Result<()> { Ok(()) }
        async fn find_by_id(&self, id: TodoItemId) -> Result<Option<TodoItem>> { self.check_read()?; Ok(self.items.lock().unwrap().get(&id).cloned()) }
        async fn exists_by_id(&self, id: TodoItemId) -> Result<bool> { self.check_read()?; Ok(self.items.lock().unwrap().contains_key(&id)) }
        async fn exists_incomplete_with_description(&self, exclude_id: TodoItemId, description: &str) -> Result<bool> {
            self.check_read()?;
            Ok(self.items.lock().unwrap().values().any(|t| !t.is_completed && t.id != exclude_id && descriptions_match(&t.description, description)))
        }
        async fn insert(&self, item: &TodoItem) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) { bail!("store unavailable") }
            let mut map = self.items.lock().unwrap();
            if map.contains_key(&item.id) { bail!("duplicate id {}", item.id) }
            map.insert(item.id, item.clone());
            Ok(())
        }
        async fn update(&self, item: &TodoItem) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) { bail!("store unavailable") }
            let mut map = self.items.lock().unwrap();
            let Some(slot) = map.get_mut(&item.id) else { bail!("no todo item {}", item.id) };
            *slot = item.clone();
            Ok(())
        }
        async fn list_all(&self) -> Result<Vec<TodoItem>> { self.check_read()?; Ok(self.items.lock().unwrap().values().cloned().collect()) }
    }

    fn id(s: &str) -> TodoItemId { TodoItemId(Uuid::parse_str(s).unwrap()) }

    fn complete_item_1() -> TodoItem { TodoItem::new(id("08099398-0c61-4f1d-a170-9380328d510f"), "Complete Item 1", true) }
    fn complete_item_2() -> TodoItem { TodoItem::new(id("d3de35a9-bb1b-4fc4-9ed3-740f556de170"), "Complete Item 2", true) }
    fn incomplete_item_1() -> TodoItem { TodoItem::new(id("a362fcf2-3c83-4be3-9778-d71b1507797c"), "Incomplete Item 1", false) }
    fn incomplete_item_2() -> TodoItem { TodoItem::new(id("6c5d118c-11cd-4344-bbdb-4f1e0a4d745a"), "Incomplete Item 2", false) }
    fn new_id() -> TodoItemId { id("93eff679-3f76-421b-99bb-39ffe0ba2262") }

    async fn seeded() -> (InMemoryRepo, TodoItemServiceImpl<InMemoryRepo>) {
        let repo = InMemoryRepo::default();
        for item in [complete_item_1(), complete_item_2(), incomplete_item_1(), incomplete_item_2()] {
            repo.insert(&item).await.unwrap();
        }
        (repo.clone(), TodoItemServiceImpl::new(repo))
    }

    fn filter(include_complete: bool, include_incomplete: bool) -> ListFilter {
        ListFilter { include_complete, include_incomplete }
    }

    #[tokio::test]
    async fn list_items_honours_filters() {
        let (_, service) = seeded().await;

        assert_eq!(service.list_items(ListFilter::default()).await.unwrap().len(), 4);

        let complete = service.list_items(filter(true, false)).await.unwrap();
        assert_eq!(complete.len(), 2);
        assert!(complete.iter().any(|t| t.id == complete_item_1().id));
        assert!(complete.iter().any(|t| t.id == complete_item_2().id));

        let incomplete = service.list_items(filter(false, true)).await.unwrap();
        assert_eq!(incomplete.len(), 2);
        assert!(incomplete.iter().any(|t| t.id == incomplete_item_1().id));
        assert!(incomplete.iter().any(|t| t.id == incomplete_item_2().id));

        assert!(service.list_items(filter(false, false)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_item_finds_complete_and_incomplete() {
        let (_, service) = seeded().await;
        let got = service.get_item(incomplete_item_1().id).await.unwrap().unwrap();
        assert_eq!(got, incomplete_item_1());
        let got = service.get_item(complete_item_1().id).await.unwrap().unwrap();
        assert_eq!(got, complete_item_1());
    }

    #[tokio::test]
    async fn get_item_with_empty_id_is_not_found() {
        let (repo, service) = seeded().await;
        repo.insert(&TodoItem::new(TodoItemId::empty(), "Stored under nil", false)).await.unwrap();
        assert!(service.get_item(TodoItemId::empty()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_item_with_unknown_id_is_not_found() {
        let (_, service) = seeded().await;
        assert!(service.get_item(new_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_item_keeps_supplied_id() {
        let (repo, service) = seeded().await;
        let result = service.create_item(Some(TodoItem::new(new_id(), "New Todo Item", false))).await.unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.item.unwrap().id, new_id());
        assert!(repo.exists_by_id(new_id()).await.unwrap());
    }

    #[tokio::test]
    async fn create_item_assigns_id_when_empty() {
        let (repo, service) = seeded().await;
        let result = service.create_item(Some(TodoItem::new(TodoItemId::empty(), "New Todo Item", false))).await.unwrap();
        assert!(result.is_valid);
        let created = result.item.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(repo.list_all().await.unwrap().iter().filter(|t| t.id == created.id).count(), 1);
    }

    #[tokio::test]
    async fn create_item_rejects_missing_item() {
        let (_, service) = seeded().await;
        let result = service.create_item(None).await.unwrap();
        assert!(!result.is_valid);
        assert!(result.item.is_none());
        assert_eq!(result.message, "Todo item doesn't exist.");
    }

    #[tokio::test]
    async fn create_item_rejects_completed_item() {
        let (repo, service) = seeded().await;
        for id in [new_id(), TodoItemId::empty()] {
            let result = service.create_item(Some(TodoItem::new(id, "New Todo Item", true))).await.unwrap();
            assert!(!result.is_valid);
            assert_eq!(result.message, "Todo item must be incomplete when created.");
        }
        assert_eq!(repo.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn create_item_rejects_existing_id() {
        let (_, service) = seeded().await;
        let result = service.create_item(Some(TodoItem::new(complete_item_1().id, "New Todo Item", false))).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Id already exists.");
    }

    #[tokio::test]
    async fn create_item_rejects_existing_description_ignoring_case() {
        let (_, service) = seeded().await;
        let result = service.create_item(Some(TodoItem::new(new_id(), "incomplete ITEM 1", false))).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Description already exists.");
    }

    #[tokio::test]
    async fn create_item_allows_description_of_completed_item() {
        let (_, service) = seeded().await;
        let result = service.create_item(Some(TodoItem::new(new_id(), "Complete Item 1", false))).await.unwrap();
        assert!(result.is_valid, "{}", result.message);
    }

    #[tokio::test]
    async fn create_item_reports_save_failure() {
        let (repo, service) = seeded().await;
        repo.fail_writes.store(true, Ordering::SeqCst);
        let result = service.create_item(Some(TodoItem::new(new_id(), "New Todo Item", false))).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Todo item couldn't be saved.");
    }

    #[tokio::test]
    async fn edit_item_updates_description() {
        let (repo, service) = seeded().await;
        let target = incomplete_item_1().id;
        let result = service.edit_item(target, TodoItem::new(target, "New Description", false)).await.unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.item.unwrap().id, target);
        assert_eq!(repo.find_by_id(target).await.unwrap().unwrap().description, "New Description");
    }

    #[tokio::test]
    async fn edit_item_rejects_mismatched_id() {
        let (_, service) = seeded().await;
        let result = service.edit_item(new_id(), TodoItem::new(incomplete_item_1().id, "New Todo Item", false)).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Id does not match.");
    }

    #[tokio::test]
    async fn edit_item_rejects_unknown_id() {
        let (_, service) = seeded().await;
        let result = service.edit_item(new_id(), TodoItem::new(new_id(), "New Todo Item", false)).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Id does not exist.");
    }

    #[tokio::test]
    async fn edit_item_checks_description_before_existence() {
        let (_, service) = seeded().await;
        let result = service.edit_item(new_id(), TodoItem::new(new_id(), "Incomplete Item 2", false)).await.unwrap();
        assert_eq!(result.message, "Description already exists.");
    }

    #[tokio::test]
    async fn edit_item_rejects_existing_description() {
        let (_, service) = seeded().await;
        let target = incomplete_item_1().id;
        let result = service.edit_item(target, TodoItem::new(target, "Incomplete Item 2", false)).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Description already exists.");
    }

    #[tokio::test]
    async fn edit_item_rejects_description_change_on_completed_item() {
        let (_, service) = seeded().await;
        let target = complete_item_1().id;
        let result = service.edit_item(target, TodoItem::new(target, "Changed", true)).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Cannot edit completed todo item.");

        // Description comparison here is case-sensitive.
        let result = service.edit_item(target, TodoItem::new(target, "complete item 1", false)).await.unwrap();
        assert_eq!(result.message, "Cannot edit completed todo item.");
    }

    #[tokio::test]
    async fn edit_item_rejects_description_change_while_completing() {
        let (repo, service) = seeded().await;
        let target = incomplete_item_1().id;
        let result = service.edit_item(target, TodoItem::new(target, "New Description", true)).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Cannot edit description for a completed todo item.");
        assert_eq!(repo.find_by_id(target).await.unwrap().unwrap(), incomplete_item_1());
    }

    #[tokio::test]
    async fn edit_item_toggles_completion() {
        let (repo, service) = seeded().await;

        let item = incomplete_item_1();
        let result = service.edit_item(item.id, TodoItem::new(item.id, item.description.clone(), true)).await.unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert!(repo.find_by_id(item.id).await.unwrap().unwrap().is_completed);

        let item = complete_item_1();
        let result = service.edit_item(item.id, TodoItem::new(item.id, item.description.clone(), false)).await.unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert!(!repo.find_by_id(item.id).await.unwrap().unwrap().is_completed);
    }

    #[tokio::test]
    async fn edit_item_with_same_values_succeeds() {
        let (_, service) = seeded().await;
        let item = incomplete_item_1();
        let result = service.edit_item(item.id, item.clone()).await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.item, Some(item));
    }

    #[tokio::test]
    async fn edit_item_reports_save_failure() {
        let (repo, service) = seeded().await;
        repo.fail_writes.store(true, Ordering::SeqCst);
        let target = incomplete_item_1().id;
        let result = service.edit_item(target, TodoItem::new(target, "New Description", false)).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "Todo item could not be saved.");
    }

    #[tokio::test]
    async fn id_exists_checks_store() {
        let (_, service) = seeded().await;
        assert!(service.id_exists(complete_item_1().id).await.unwrap());
        assert!(!service.id_exists(new_id()).await.unwrap());
    }

    #[tokio::test]
    async fn description_exists_rules() {
        let (repo, service) = seeded().await;
        assert!(!service.description_exists(new_id(), "new description").await.unwrap());
        assert!(service.description_exists(new_id(), "Incomplete Item 1").await.unwrap());
        assert!(service.description_exists(new_id(), "incomplete item 1").await.unwrap());
        assert!(!service.description_exists(incomplete_item_1().id, "Incomplete Item 1").await.unwrap());

        repo.insert(&TodoItem::new(id("48c9212f-2523-49f5-afdd-40d0b44a6d8c"), "Same Description", true)).await.unwrap();
        assert!(!service.description_exists(new_id(), "Same Description").await.unwrap());
    }

    #[tokio::test]
    async fn read_faults_are_returned_as_errors() {
        let (repo, service) = seeded().await;
        repo.fail_reads.store(true, Ordering::SeqCst);

        assert!(service.list_items(ListFilter::default()).await.is_err());
        assert!(service.get_item(incomplete_item_1().id).await.is_err());
        assert!(service.create_item(Some(TodoItem::new(new_id(), "New Todo Item", false))).await.is_err());
        assert!(service.create_item(Some(TodoItem::new(TodoItemId::empty(), "New Todo Item", false))).await.is_err());
        let target = incomplete_item_1().id;
        assert!(service.edit_item(target, TodoItem::new(target, "New Description", false)).await.is_err());

        // Rules that need no store access still answer.
        let result = service.edit_item(new_id(), incomplete_item_1()).await.unwrap();
        assert_eq!(result.message, "Id does not match.");
        assert!(service.get_item(TodoItemId::empty()).await.unwrap().is_none());
    }
}
