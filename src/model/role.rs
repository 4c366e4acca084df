/// What a caller is allowed to do with leave data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capability {
    ApplyLeave,
    /// Review requests of employees mapped to the caller as their manager.
    ReviewTeamLeave,
    ReviewAnyLeave,
    ManageBalances,
    ManageHolidays,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    SuperAdmin = 1,
    Hr = 2,
    Employee = 3,
    Manager = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Manager),
            _ => None,
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::SuperAdmin | Role::Hr => &[
                ApplyLeave,
                ReviewAnyLeave,
                ManageBalances,
                ManageHolidays,
            ],
            Role::Manager => &[ApplyLeave, ReviewTeamLeave],
            Role::Employee => &[ApplyLeave],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip_and_reject_unknown() {
        for role in [Role::SuperAdmin, Role::Hr, Role::Employee, Role::Manager] {
            assert_eq!(Role::from_id(role as u8), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(5), None);
    }

    #[test]
    fn only_managers_are_team_scoped() {
        assert!(Role::Manager.can(Capability::ReviewTeamLeave));
        assert!(!Role::Manager.can(Capability::ReviewAnyLeave));
        assert!(!Role::Manager.can(Capability::ManageBalances));
        assert!(Role::Hr.can(Capability::ReviewAnyLeave));
        assert!(Role::SuperAdmin.can(Capability::ManageHolidays));
        assert!(!Role::Employee.can(Capability::ReviewTeamLeave));
        assert!(Role::Employee.can(Capability::ApplyLeave));
    }
}
