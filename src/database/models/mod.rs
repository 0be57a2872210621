mod class;
mod department;
mod enrollment;
mod grade;
mod guardian;
mod period;
mod professor;
mod school_year;
mod student;
mod student_guardian;
mod subject;
mod term;
mod user;

pub use class::{Class, ClassPayload};
pub use department::{Department, DepartmentPayload};
pub use enrollment::{Enrollment, EnrollmentPayload};
pub use grade::{Grade, GradePayload};
pub use guardian::{Guardian, GuardianPayload};
pub use period::{Period, PeriodPayload};
pub use professor::{Professor, ProfessorPayload};
pub use school_year::{SchoolYear, SchoolYearPayload};
pub use student::{Student, StudentPayload};
pub use student_guardian::{StudentGuardian, StudentGuardianPayload};
pub use subject::{Subject, SubjectPayload};
pub use term::{Term, TermPayload};
pub use user::{User, UserPayload};
