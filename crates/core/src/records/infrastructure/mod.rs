pub mod jsonl_record_store;
