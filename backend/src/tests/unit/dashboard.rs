use crate::reporting::dashboard::{build_dashboard, ChatActivity};
use crate::reporting::ReportRules;
use crate::store::DashboardConversation;
use crate::tests::fixtures::*;

fn attended(chat_id: &str, attendant: &str) -> DashboardConversation {
    DashboardConversation {
        attendant_name: Some(attendant.into()),
        start_time: Some(march(4, 12, 0)),
        ..dashboard_conversation(chat_id)
    }
}

#[test]
fn vendors_with_equal_contacts_are_listed_by_name() {
    let conversations = vec![
        attended("c1", "Carla"),
        attended("c2", "Ana"),
        attended("c3", "Bruno"),
        attended("c4", "Bruno"),
    ];
    let dashboard = build_dashboard(&conversations, Vec::new(), &ReportRules::default());

    let names: Vec<&str> = dashboard
        .vendors
        .summary
        .iter()
        .map(|v| v.vendedor.as_str())
        .collect();
    assert_eq!(names, vec!["Bruno", "Ana", "Carla"]);
}

#[test]
fn undated_conversations_are_reported_last() {
    let conversations = vec![dashboard_conversation("c1"), attended("c2", "Ana")];
    let dashboard = build_dashboard(&conversations, Vec::new(), &ReportRules::default());

    let days: Vec<_> = dashboard.sdr.daily.iter().map(|d| d.day).collect();
    assert_eq!(days.len(), 2);
    assert!(days[0].is_some());
    assert!(days[1].is_none());
}

#[test]
fn weekend_only_conversation_counts_as_zero_seconds() {
    // Saturday 9 March, local 09:00-12:00
    let weekend = DashboardConversation {
        end_time: Some(march(9, 15, 0)),
        ..dashboard_conversation("sat")
    };
    let weekday = DashboardConversation {
        end_time: Some(march(4, 13, 0)),
        ..dashboard_conversation("mon")
    };
    let messages = vec![
        client_says("sat", march(9, 12, 0), "Oi"),
        client_says("mon", march(4, 12, 0), "Oi"),
    ];

    let dashboard = build_dashboard(&[weekend, weekday], messages, &ReportRules::default());
    // (0 + 3600) / 2
    assert_eq!(dashboard.stats.avg_duration_seconds, 1800.0);
}

#[test]
fn activity_of_one_chat() {
    let messages = vec![
        client_says("c1", march(4, 12, 10), "Segunda mensagem"),
        client_says("c1", march(4, 12, 0), "Primeira"),
        agent_says("c1", march(4, 12, 20), "Vou encaminhar ao nosso time de vendas"),
        agent_says("c1", march(4, 12, 30), "Proposta: R$ 99,90"),
    ];
    let activity = ChatActivity::from_messages(&messages, &ReportRules::default());

    assert_eq!(activity.first_client_at, Some(march(4, 12, 0)));
    assert_eq!(activity.agent_messages, 2);
    assert!(!activity.is_dead());
    let handoff = activity.handoff.unwrap();
    assert_eq!(handoff.transferred_at, march(4, 12, 20));
    assert_eq!(handoff.first_human_at, Some(march(4, 12, 30)));
    assert_eq!(activity.quoted_budget.map(|d| d.to_string()), Some("99.90".to_string()));
}

#[test]
fn huge_quoted_amounts_do_not_break_vendor_sums() {
    let conversations = vec![attended("c1", "Ana"), attended("c2", "Ana")];
    let messages = vec![
        client_says("c1", march(4, 12, 0), "posso pagar R$ 50000000000000000000000000000"),
        client_says("c2", march(4, 12, 0), "posso pagar R$ 50000000000000000000000000000"),
    ];
    let dashboard = build_dashboard(&conversations, messages, &ReportRules::default());

    let ana = &dashboard.vendors.summary[0];
    assert_eq!(ana.budgets_detected_count, 2);
    assert!(ana.budgets_sum_detected > 7.9e28);
}
