pub mod resource_account;
pub mod resource_account_privileges;
pub mod resource_instance;
pub mod resource_security_groups;

pub use resource_account::MariadbAccountResource;
pub use resource_account_privileges::MariadbAccountPrivilegesResource;
pub use resource_instance::MariadbInstanceResource;
pub use resource_security_groups::MariadbSecurityGroupsResource;
