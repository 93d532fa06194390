//! Automation families: workflows, business calendars and scheduling rules.
//!
//! All three list with `offset` pagination (`results` / `count`) and accept
//! `adminAccess=true`, which lets an administrator see objects owned by other
//! users. Credentials without the admin scope get a 403 for it; the request
//! is then repeated once without the flag.

use crate::rest::{AdminAccess, Paging, ResourceKind};

const RESULTS: Paging = Paging::Offset {
    items: "results",
    total: "count",
};

/// Workflows under `platform/automation/v1/workflows`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Workflow;

impl ResourceKind for Workflow {
    const NAME: &'static str = "workflow";
    const PATH: &'static str = "platform/automation/v1/workflows";
    const ID_FIELD: &'static str = "id";
    const PAGING: Paging = RESULTS;
    const ADMIN_ACCESS: AdminAccess = AdminAccess::WithFallback;
}

/// Business calendars under `platform/automation/v1/business-calendars`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusinessCalendar;

impl ResourceKind for BusinessCalendar {
    const NAME: &'static str = "business calendar";
    const PATH: &'static str = "platform/automation/v1/business-calendars";
    const ID_FIELD: &'static str = "id";
    const PAGING: Paging = RESULTS;
    const ADMIN_ACCESS: AdminAccess = AdminAccess::WithFallback;
}

/// Scheduling rules under `platform/automation/v1/scheduling-rules`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulingRule;

impl ResourceKind for SchedulingRule {
    const NAME: &'static str = "scheduling rule";
    const PATH: &'static str = "platform/automation/v1/scheduling-rules";
    const ID_FIELD: &'static str = "id";
    const PAGING: Paging = RESULTS;
    const ADMIN_ACCESS: AdminAccess = AdminAccess::WithFallback;
}
