pub mod attendance;
pub mod guardian;
pub mod sms;
pub mod student;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use guardian::Guardian;
pub use sms::{SmsConfiguration, SmsLog, SmsLogFilter};
pub use student::Student;
