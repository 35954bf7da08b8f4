//! Flow block module types.
//!
//! Each event record carries a `ContactFlowModuleType` string. Known types
//! get their own variant; anything else is kept verbatim in `Other`.

use crate::utils::config::{AGGREGATABLE_MODULE_TYPES, OMITTED_MODULE_TYPES};
use std::fmt;

/// Type of flow block that produced an event record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleType {
    CheckAttribute,
    InvokeExternalResource,
    InvokeLambdaFunction,
    PlayPrompt,
    GetUserInput,
    StoreUserInput,
    TagContact,
    SetAttributes,
    SetFlowAttributes,
    SetLoggingBehavior,
    SetContactFlow,
    SetContactData,
    GetCustomerProfile,
    AssociateContactToCustomerProfile,
    Dial,
    Resume,
    ReturnFromFlowModule,
    InvokeFlowModule,
    Other(String),
}

impl From<&str> for ModuleType {
    fn from(s: &str) -> Self {
        match s {
            "CheckAttribute" => Self::CheckAttribute,
            "InvokeExternalResource" => Self::InvokeExternalResource,
            "InvokeLambdaFunction" => Self::InvokeLambdaFunction,
            "PlayPrompt" => Self::PlayPrompt,
            "GetUserInput" => Self::GetUserInput,
            "StoreUserInput" => Self::StoreUserInput,
            "TagContact" => Self::TagContact,
            "SetAttributes" => Self::SetAttributes,
            "SetFlowAttributes" => Self::SetFlowAttributes,
            "SetLoggingBehavior" => Self::SetLoggingBehavior,
            "SetContactFlow" => Self::SetContactFlow,
            "SetContactData" => Self::SetContactData,
            "GetCustomerProfile" => Self::GetCustomerProfile,
            "AssociateContactToCustomerProfile" => Self::AssociateContactToCustomerProfile,
            "Dial" => Self::Dial,
            "Resume" => Self::Resume,
            "ReturnFromFlowModule" => Self::ReturnFromFlowModule,
            "InvokeFlowModule" => Self::InvokeFlowModule,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::str::FromStr for ModuleType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl ModuleType {
    /// Wire name of the module type
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckAttribute => "CheckAttribute",
            Self::InvokeExternalResource => "InvokeExternalResource",
            Self::InvokeLambdaFunction => "InvokeLambdaFunction",
            Self::PlayPrompt => "PlayPrompt",
            Self::GetUserInput => "GetUserInput",
            Self::StoreUserInput => "StoreUserInput",
            Self::TagContact => "TagContact",
            Self::SetAttributes => "SetAttributes",
            Self::SetFlowAttributes => "SetFlowAttributes",
            Self::SetLoggingBehavior => "SetLoggingBehavior",
            Self::SetContactFlow => "SetContactFlow",
            Self::SetContactData => "SetContactData",
            Self::GetCustomerProfile => "GetCustomerProfile",
            Self::AssociateContactToCustomerProfile => "AssociateContactToCustomerProfile",
            Self::Dial => "Dial",
            Self::Resume => "Resume",
            Self::ReturnFromFlowModule => "ReturnFromFlowModule",
            Self::InvokeFlowModule => "InvokeFlowModule",
            Self::Other(name) => name,
        }
    }

    /// Consecutive runs of this type collapse into one node
    pub fn is_aggregatable(&self) -> bool {
        AGGREGATABLE_MODULE_TYPES.contains(&self.as_str())
    }

    /// Events of this type produce no node and no edge
    pub fn is_omitted(&self) -> bool {
        OMITTED_MODULE_TYPES.contains(&self.as_str())
    }

    pub fn is_external_invocation(&self) -> bool {
        matches!(self, Self::InvokeExternalResource | Self::InvokeLambdaFunction)
    }

    pub fn is_attribute_set(&self) -> bool {
        matches!(self, Self::SetAttributes | Self::SetFlowAttributes)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
