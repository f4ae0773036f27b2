use ledger_core::application::service::LedgerService;
use ledger_core::domain::account::{Amount, Balance};
use ledger_core::domain::ports::AccountStoreBox;
use ledger_core::domain::transfer::{Transfer, TransferId, TransferStatus};
use ledger_core::infrastructure::in_memory::InMemoryAccountStore;
use std::sync::Arc;

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: AccountStoreBox = Box::new(InMemoryAccountStore::new());

    // Verify Send + Sync by moving the boxed store into a task
    let handle = tokio::spawn(async move {
        let a = store.create_account(Balance(10)).await.unwrap();
        let b = store.create_account(Balance(0)).await.unwrap();
        let tx = Transfer::pending(TransferId::new("dyn-1").unwrap(), a, b, Amount::new(4).unwrap())
            .unwrap();
        let applied = store.apply_pair(&tx).await.unwrap();
        (applied, store.get_balance(&a).await.unwrap(), store.get_balance(&b).await.unwrap())
    });

    let (applied, a, b) = handle.await.unwrap();
    assert_eq!(applied.status, TransferStatus::Applied);
    assert_eq!(a, Balance(6));
    assert_eq!(b, Balance(4));
}

#[tokio::test]
async fn test_service_shared_across_tasks() {
    let service = Arc::new(LedgerService::new(Box::new(InMemoryAccountStore::new())));
    let a = service.create_account(10).await.unwrap();
    let b = service.create_account(0).await.unwrap();

    let handle = {
        let service = service.clone();
        let (a, b) = (a.clone(), b.clone());
        tokio::spawn(async move { service.transfer_funds(&a, &b, 10).await })
    };
    handle.await.unwrap().unwrap();

    assert_eq!(service.get_balance(&a).await.unwrap(), 0);
    assert_eq!(service.get_balance(&b).await.unwrap(), 10);
}
