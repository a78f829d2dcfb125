pub mod contract;
pub mod modification;
pub mod schedule;

pub use contract::{parse_date, LeaseContract, LeaseModification, PaymentFrequency};
pub use schedule::{
    calculate_lease, generate_schedule, present_value, LeaseScheduleOutput, ScheduleRow,
};
