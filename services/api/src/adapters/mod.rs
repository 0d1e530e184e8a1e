pub mod blurb_llm;
pub mod db;
