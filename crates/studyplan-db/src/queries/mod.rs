pub mod study_plans;
