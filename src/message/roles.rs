//! Role vocabulary URIs carried in the roles claim

#![allow(missing_docs)]

// Core institution roles
pub const INSTITUTION_ADMINISTRATOR: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Administrator";
pub const INSTITUTION_FACULTY: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Faculty";
pub const INSTITUTION_GUEST: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Guest";
pub const INSTITUTION_NONE: &str = "http://purl.imsglobal.org/vocab/lis/v2/institution/person#None";
pub const INSTITUTION_OTHER: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Other";
pub const INSTITUTION_STAFF: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Staff";
pub const INSTITUTION_STUDENT: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Student";

// Non-core institution roles
pub const INSTITUTION_ALUMNI: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Alumni";
pub const INSTITUTION_INSTRUCTOR: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Instructor";
pub const INSTITUTION_LEARNER: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Learner";
pub const INSTITUTION_MEMBER: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Member";
pub const INSTITUTION_MENTOR: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Mentor";
pub const INSTITUTION_OBSERVER: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Observer";
pub const INSTITUTION_PROSPECTIVE_STUDENT: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#ProspectiveStudent";

// Core context roles
pub const CONTEXT_ADMINISTRATOR: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/membership#Administrator";
pub const CONTEXT_CONTENT_DEVELOPER: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/membership#ContentDeveloper";
pub const CONTEXT_INSTRUCTOR: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor";
pub const CONTEXT_LEARNER: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner";
pub const CONTEXT_MENTOR: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Mentor";

// Non-core context roles
pub const CONTEXT_MANAGER: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Manager";
pub const CONTEXT_MEMBER: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Member";
pub const CONTEXT_OFFICER: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Officer";

/// Roles that may manage course content and grades
pub const TEACHING: &[&str] = &[
    CONTEXT_INSTRUCTOR,
    CONTEXT_ADMINISTRATOR,
    CONTEXT_CONTENT_DEVELOPER,
    INSTITUTION_ADMINISTRATOR,
];
