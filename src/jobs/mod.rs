pub mod queue_worker;
