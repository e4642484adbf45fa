// Integration tests for /api/dashboard/

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use crate::store::{DashboardConversation, DashboardMessage, MockReportStore};
use crate::tests::fixtures::*;
use crate::tests::helpers::{get_json, test_app};

/// Four conversations over Monday 4 and Tuesday 5 March 2024:
/// - c1: Ana, closed, handed off by the bot, stated budget 500
/// - c2: Ana, waiting, support question, never answered
/// - c3: Bruno, active, budget only quoted in chat
/// - c4: no attendant, tracking question, no messages
fn conversations() -> Vec<DashboardConversation> {
    vec![
        DashboardConversation {
            current_funnel_stage: Some("Finalizado".into()),
            start_time: Some(march(4, 12, 0)),
            end_time: Some(march(4, 14, 0)),
            attendant_name: Some("Ana".into()),
            contact_reason: Some("Orçamento".into()),
            budget_value: Some(Decimal::new(500, 0)),
            ai_agent_rating: Some("8".into()),
            ..dashboard_conversation("c1")
        },
        DashboardConversation {
            current_funnel_stage: Some("waiting".into()),
            start_time: Some(march(4, 13, 0)),
            attendant_name: Some("Ana".into()),
            contact_reason: Some("Dúvidas".into()),
            ..dashboard_conversation("c2")
        },
        DashboardConversation {
            current_funnel_stage: Some("active".into()),
            start_time: Some(march(5, 12, 0)),
            end_time: Some(march(5, 13, 0)),
            attendant_name: Some("Bruno".into()),
            contact_reason: Some("Orçamento".into()),
            ai_agent_rating: Some("nota 6".into()),
            ..dashboard_conversation("c3")
        },
        DashboardConversation {
            created_at: Some(march(5, 12, 0)),
            contact_reason: Some("Rastreio".into()),
            ..dashboard_conversation("c4")
        },
    ]
}

fn messages() -> Vec<DashboardMessage> {
    vec![
        client_says("c1", march(4, 12, 0), "Quero um orçamento"),
        agent_says("c1", march(4, 12, 5), "Obrigada, vou encaminhar ao nosso time de vendas"),
        agent_says("c1", march(4, 12, 35), "Olá, sou a Ana. Fica R$ 1.250,00"),
        client_says("c2", march(4, 13, 0), "Oi"),
        client_says("c3", march(5, 12, 0), "Preço?"),
        agent_says("c3", march(5, 12, 10), "Total R$ 2.400,50"),
    ]
}

fn store() -> MockReportStore {
    let mut store = MockReportStore::new();
    store
        .expect_dashboard_conversations()
        .returning(|_| Ok(conversations()));
    store
        .expect_dashboard_messages()
        .withf(|ids| ids.len() == 4)
        .returning(|_| Ok(messages()));
    store
}

#[tokio::test]
async fn stats_and_stage_counts() {
    let (status, body) = get_json(test_app(store()), "/api/dashboard/").await;
    assert_eq!(status, StatusCode::OK);

    // c1: 09:00-11:00 local; c3: 09:00-10:00 local
    assert_eq!(body["stats"]["avg_duration_seconds"], json!(5400.0));
    // c1: handoff 09:05, human at 09:35
    assert_eq!(body["stats"]["avg_handoff_seconds"], json!(1800.0));

    assert_eq!(
        body["stage_counts"],
        json!([
            {"stage_name": "Aguardando", "total": 1},
            {"stage_name": "Finalizado", "total": 1},
        ])
    );

    let breakdown = &body["contacts_breakdown"];
    assert_eq!(breakdown["total"], json!(3));
    assert_eq!(breakdown["finalized"], json!(1));
    assert_eq!(breakdown["active"], json!(1));
    assert_eq!(breakdown["pending"], json!(1));
    assert_eq!(breakdown["other"], json!(0));
}

#[tokio::test]
async fn sdr_funnel() {
    let (_, body) = get_json(test_app(store()), "/api/dashboard/").await;
    let sdr = &body["sdr"];

    assert_eq!(
        sdr["summary"],
        json!({
            "contacts": 4,
            "tracking": 1,
            "sac": 1,
            "waiting": 0,
            "sales": 2,
            "transferred": 1,
            "dead": 2,
        })
    );
    assert_eq!(
        sdr["daily"],
        json!([
            {"day": "2024-03-04", "contacts": 2, "tracking": 2, "dead": 1},
            {"day": "2024-03-05", "contacts": 2, "tracking": 1, "dead": 1},
        ])
    );
    assert_eq!(
        sdr["transferred_daily"],
        json!([{"day": "2024-03-04", "transferred": 1}])
    );
}

#[tokio::test]
async fn vendor_summary_and_scores() {
    let (_, body) = get_json(test_app(store()), "/api/dashboard/").await;
    let vendors = &body["vendors"];

    let summary = vendors["summary"].as_array().unwrap();
    assert_eq!(summary.len(), 2);

    let ana = &summary[0];
    assert_eq!(ana["vendedor"], json!("Ana"));
    assert_eq!(ana["contacts_received"], json!(2));
    assert_eq!(ana["budgets_count"], json!(1));
    assert_eq!(ana["budgets_detected_count"], json!(1));
    assert_eq!(ana["budgets_sum"], json!(500.0));
    assert_eq!(ana["budgets_sum_detected"], json!(0.0));
    assert_eq!(ana["dead_contacts"], json!(1));
    assert_eq!(ana["avg_duration_seconds"], json!(7200.0));
    assert_eq!(ana["avg_handoff_seconds"], json!(1800.0));
    assert_eq!(ana["avg_score"], json!(8.0));

    let bruno = &summary[1];
    assert_eq!(bruno["vendedor"], json!("Bruno"));
    assert_eq!(bruno["budgets_count"], json!(0));
    assert_eq!(bruno["budgets_detected_count"], json!(1));
    assert_eq!(bruno["budgets_sum_detected"], json!(2400.5));
    assert_eq!(bruno["avg_handoff_seconds"], json!(0.0));
    assert_eq!(bruno["avg_score"], json!(6.0));

    assert_eq!(
        vendors["scores"],
        json!({
            "Ana": [{"score": "8", "total": 1}, {"score": "Sem score", "total": 1}],
            "Bruno": [{"score": "nota 6", "total": 1}],
        })
    );
}

#[tokio::test]
async fn filters_reach_the_store_normalized() {
    let mut store = MockReportStore::new();
    store
        .expect_dashboard_conversations()
        .withf(|filters| {
            filters.status.is_none()
                && filters.vendedor.as_deref() == Some("Ana")
                && filters.date_from.as_deref() == Some("2024-03-01")
                && filters.date_to.is_none()
        })
        .returning(|_| Ok(Vec::new()));
    store
        .expect_dashboard_messages()
        .withf(|ids| ids.is_empty())
        .returning(|_| Ok(Vec::new()));

    let (status, body) = get_json(
        test_app(store),
        "/api/dashboard/?status=Todos&vendedor=Ana&date_from=2024-03-01T00:00:00&date_to=",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["avg_duration_seconds"], json!(0.0));
    assert_eq!(body["sdr"]["summary"]["contacts"], json!(0));
    assert_eq!(body["vendors"]["summary"], json!([]));
    assert_eq!(body["stage_counts"], json!([]));
}

#[tokio::test]
async fn malformed_date_is_reported_as_error_body() {
    let (status, body) = get_json(
        test_app(MockReportStore::new()),
        "/api/dashboard/?date_to=31/03/2024",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("date_to"));
}

#[tokio::test]
async fn support_conversation_quotes_are_not_detected_budgets() {
    let mut store = MockReportStore::new();
    store.expect_dashboard_conversations().returning(|_| {
        Ok(vec![
            DashboardConversation {
                start_time: Some(march(4, 12, 0)),
                attendant_name: Some("Ana".into()),
                contact_reason: Some("Dúvidas".into()),
                ..dashboard_conversation("sac")
            },
            DashboardConversation {
                start_time: Some(march(4, 13, 0)),
                attendant_name: Some("Ana".into()),
                contact_reason: Some("Orçamento".into()),
                ..dashboard_conversation("sale")
            },
        ])
    });
    store.expect_dashboard_messages().returning(|_| {
        Ok(vec![
            agent_says("sac", march(4, 12, 5), "Valor fica em R$ 1.250,00 ok?"),
            agent_says("sale", march(4, 13, 5), "Total R$ 300,00"),
        ])
    });

    let (status, body) = get_json(test_app(store), "/api/dashboard/").await;
    assert_eq!(status, StatusCode::OK);

    let ana = &body["vendors"]["summary"][0];
    assert_eq!(ana["vendedor"], json!("Ana"));
    assert_eq!(ana["contacts_received"], json!(2));
    assert_eq!(ana["budgets_detected_count"], json!(1));
    assert_eq!(ana["budgets_sum_detected"], json!(300.0));
}
