//! Attribute names written by the roster and by the survey reports.

// roster subjects
pub const NODE_ID: &str = "nodeID";
pub const PARENT_ID: &str = "parentID";
pub const TEAM_NAME: &str = "teamName";
pub const NAME: &str = "name";
pub const FULL_NAME: &str = "fullName";
pub const EMAIL: &str = "email";
pub const DESCRIPTION: &str = "description";
pub const STATUS: &str = "status";
pub const TYPE: &str = "type";
pub const ACTIVE: &str = "active";
pub const PROGRAM_NAME: &str = "programName";
pub const ORG_UNIT: &str = "orgUnit";

/// Everything a roster subject declares, in declaration order.
pub const SUBJECT_ATTRIBUTES: [&str; 12] = [
    NODE_ID,
    PARENT_ID,
    TEAM_NAME,
    NAME,
    FULL_NAME,
    EMAIL,
    DESCRIPTION,
    STATUS,
    TYPE,
    ACTIVE,
    PROGRAM_NAME,
    ORG_UNIT,
];

// report buckets
pub const SAT_SURVEYS: &str = "satSurveys";
pub const ALL_SURVEYS: &str = "allSurveys";
pub const VIABLE_SURVEYS: &str = "viableSurveys";
pub const PROMOTERS: &str = "netPromoters";
pub const DETRACTORS: &str = "nonNetPromoters";
