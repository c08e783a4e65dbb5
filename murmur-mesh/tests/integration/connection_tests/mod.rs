mod test_relay_session_events;
