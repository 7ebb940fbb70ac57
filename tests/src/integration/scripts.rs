//! # Script Replay
//!
//! The node's JSON scripts drive the same engine end to end.

#[cfg(test)]
mod tests {
    use covenant_engine::EngineConfig;
    use covenant_node::{parse_script, Runner};
    use serde_json::json;

    const ALICE: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
    const BOB: &str = "b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2";
    const CREATOR: &str = "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c";

    #[test]
    fn test_completion_script() {
        let script = json!({
            "start_time": 1_000,
            "steps": [
                { "op": "create_agreement", "caller": CREATOR, "title": "Delivery",
                  "parties": [
                      { "wallet": ALICE, "name": "Alice" },
                      { "wallet": BOB, "name": "Bob" }
                  ] },
                { "op": "sign_agreement", "caller": ALICE, "agreement": 0, "value": 100 },
                { "op": "sign_agreement", "caller": BOB, "agreement": 0, "value": 50 },
                { "op": "add_term", "caller": BOB, "agreement": 0, "description": "ship",
                  "responsible_party": 0, "deadline": 5_000 },
                { "op": "advance_time", "secs": 60 },
                { "op": "resolve_term", "caller": BOB, "agreement": 0, "term": 0 },
                { "op": "withdraw_collateral", "caller": ALICE, "agreement": 0, "party": 0 },
                { "op": "withdraw_collateral", "caller": ALICE, "agreement": 0, "party": 0 },
                { "op": "get_agreement", "agreement": 0 },
                { "op": "get_user_agreements", "wallet": BOB }
            ]
        });

        let script = parse_script(&script.to_string()).unwrap();
        let report = Runner::new(EngineConfig::default())
            .run(&script, false)
            .unwrap();

        let ok: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
        assert_eq!(
            ok,
            vec![true, true, true, true, true, true, true, false, true, true]
        );
        assert!(report.steps[7]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("withdraw")));

        let agreement = report.steps[8].result.clone().unwrap();
        assert_eq!(agreement["status"], json!("Completed"));
        assert_eq!(agreement["total_collateral"], json!("50"));
        assert_eq!(report.steps[9].result, Some(json!([0])));
        assert_eq!(report.total_agreements, 1);
        assert_eq!(report.calls_rejected, 1);
    }

    #[test]
    fn test_event_log_step() {
        let script = json!({
            "steps": [
                { "op": "create_agreement", "caller": CREATOR, "title": "Log",
                  "parties": [
                      { "wallet": ALICE, "name": "Alice" },
                      { "wallet": BOB, "name": "Bob" }
                  ] },
                { "op": "events", "agreement": 0 }
            ]
        });
        let script = parse_script(&script.to_string()).unwrap();
        let report = Runner::new(EngineConfig::default())
            .run(&script, true)
            .unwrap();

        let events = report.steps[1].result.clone().unwrap();
        assert_eq!(events[0]["event"], json!("agreement_created"));
    }
}
