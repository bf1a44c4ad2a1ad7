//! End-to-end tests over the in-memory stack.
//!
//! Tests: JobContext → PostingService → LedgerStore → EventBus → reports
//!
//! Verifies:
//! - seeding leaves a ledger whose reports agree with the postings
//! - concurrent posts of one entry apply its lines exactly once
//! - consumers see events only for committed changes

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use easyerp_accounting::reports::{
        EntryStatus, JournalFilter, balance_sheet, dashboard, income_statement, status_counts,
        trial_balance,
    };
    use easyerp_accounting::setup::standard_chart;
    use easyerp_accounting::{JournalLine, PostingPolicy};
    use easyerp_core::DomainError;
    use easyerp_events::{EventBus, EventEnvelope, InMemoryEventBus};

    use crate::config::AppConfig;
    use crate::jobs::{JobContext, seed_sample_entries};
    use crate::service::{NewJournalEntry, PostingError, PostingService};
    use crate::store::{InMemoryLedgerStore, LedgerStore, LedgerStoreError};

    #[tokio::test]
    async fn seeded_ledger_reports_are_consistent() {
        let ctx = JobContext::in_memory("seed", AppConfig::default());
        let sub = ctx.bus.subscribe();

        seed_sample_entries(&ctx).await.unwrap();

        // created + posted for each of the six samples
        assert_eq!(sub.drain().len(), 12);

        let chart = ctx.store().chart().await.unwrap();
        let entries = ctx.store().entries().await.unwrap();

        // Balanced entries never change the trial balance difference.
        let opening = trial_balance(&standard_chart().unwrap(), false);
        let closing = trial_balance(&chart, false);
        assert_eq!(
            closing.total_debit - closing.total_credit,
            opening.total_debit - opening.total_credit
        );

        let income = income_statement(&chart);
        assert_eq!(income.total_revenue, dec!(1500.00));
        assert_eq!(income.total_expenses, dec!(9400.00));
        assert_eq!(income.net_income, dec!(-7900.00));

        let sheet = balance_sheet(&chart);
        assert_eq!(sheet.current_earnings, income.net_income);

        let summary = dashboard(&chart, &entries);
        assert_eq!(summary.unposted_entries, 0);
        assert_eq!(summary.recent_entries.len(), 5);
        assert_eq!(summary.net_worth, summary.total_assets - summary.total_liabilities);

        let counts = status_counts(&entries);
        assert_eq!((counts.posted, counts.draft), (6, 0));

        let payments = JournalFilter {
            search: Some("pay-2025".to_string()),
            status: Some(EntryStatus::Posted),
            date_from: None,
        };
        assert_eq!(payments.apply(&entries).len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_posts_apply_once() {
        let ctx = JobContext::in_memory("race", AppConfig::default());
        seed_sample_entries(&JobContext::new(
            "setup",
            AppConfig::from_toml("[seed]\npost_sample_entries = false").unwrap(),
            ctx.store().clone(),
        ))
        .await
        .unwrap();

        let cash_before = ctx.store().account("1000").await.unwrap().unwrap().balance;
        let salary = ctx
            .store()
            .entries()
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.reference() == "PAY-2025-002")
            .unwrap();

        let service = Arc::new(ctx.service);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let id = salary.id_typed();
                tokio::spawn(async move { service.post(id, None).await })
            })
            .collect();

        let mut succeeded = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(PostingError::Store(LedgerStoreError::Domain(DomainError::Conflict(_)))) => {
                    conflicts += 1
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((succeeded, conflicts), (1, 7));

        let cash_after = service.store().account("1000").await.unwrap().unwrap().balance;
        assert_eq!(cash_after, cash_before - dec!(8500.00));
    }

    #[tokio::test]
    async fn failed_post_publishes_nothing_and_moves_nothing() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let bus: Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>> =
            Arc::new(InMemoryEventBus::new());
        let service = PostingService::new(store.clone(), bus.clone(), PostingPolicy::Strict);

        let ctx = JobContext::new("setup", AppConfig::default(), store.clone());
        crate::jobs::setup_general_ledger(&ctx).await.unwrap();
        let chart_before = store.chart().await.unwrap();

        let entry = service
            .create_entry(NewJournalEntry::new(
                "one-sided",
                vec![JournalLine::debit("6300", dec!(120.00))],
            ))
            .await
            .unwrap();

        let sub = bus.subscribe();
        let err = service.post(entry.id_typed(), None).await.unwrap_err();
        assert!(matches!(
            err,
            PostingError::Store(LedgerStoreError::Domain(DomainError::InvariantViolation(_)))
        ));
        assert!(sub.drain().is_empty());
        assert_eq!(store.chart().await.unwrap(), chart_before);
        assert!(!store.entry(entry.id_typed()).await.unwrap().unwrap().is_posted());
    }
}
