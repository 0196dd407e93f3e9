// Hand-authored to match the three tables named in the persisted-state
// section: known_connectors, known_dtrs, edr_store. No migrations
// directory ships with this crate; operators are expected to create these
// tables with a migration tool of their choosing, matching the tables
// below exactly.

diesel::table! {
  known_connectors (bpnl) {
    bpnl -> Text,
    connectors -> Jsonb,
    expires_at -> Timestamptz,
  }
}

diesel::table! {
  known_dtrs (bpnl, asset_id) {
    bpnl -> Text,
    edc_url -> Text,
    asset_id -> Text,
    policies -> Jsonb,
    expires_at -> Timestamptz,
  }
}

diesel::table! {
  edr_store (transfer_id) {
    transfer_id -> Text,
    counter_party_id -> Text,
    counter_party_address -> Text,
    query_checksum -> Text,
    policy_checksum -> Text,
    edr_data -> Jsonb,
  }
}
