mod api_conversations;
mod api_dashboard;
mod api_events;
mod api_health;
mod api_messages;
