use crate::models::ModuleState;

/// Aggregate completion percentage of a wizard session.
///
/// Completion is authoritative: a completed session is always 100, and an
/// unfinished one never reports more than 99. Halves round up.
pub fn progress(modules: &[ModuleState], current_module_index: usize, completed: bool) -> u8 {
    if completed {
        return 100;
    }
    if modules.is_empty() {
        return 0;
    }

    let mut total: u64 = 0;
    let mut done: u64 = 0;
    for (i, module) in modules.iter().enumerate() {
        let steps = u64::from(module.total_steps);
        total += steps;
        done += if module.completed || i < current_module_index {
            steps
        } else if i == current_module_index {
            u64::from(module.current_step).min(steps)
        } else {
            0
        };
    }
    if total == 0 {
        return 0;
    }

    let percent = (200 * done + total) / (2 * total);
    percent.min(99) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceKind;
    use crate::wizard::catalog::total_steps;

    fn module(kind: ServiceKind, current_step: u32, completed: bool) -> ModuleState {
        ModuleState {
            kind,
            current_step,
            total_steps: total_steps(kind),
            completed,
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(progress(&[], 0, false), 0);
    }

    #[test]
    fn test_completed_is_authoritative() {
        let modules = vec![module(ServiceKind::Flights, 0, false)];
        assert_eq!(progress(&modules, 0, true), 100);
    }

    #[test]
    fn test_single_module() {
        let modules = vec![module(ServiceKind::Flights, 1, false)];
        assert_eq!(progress(&modules, 0, false), 33);
        let modules = vec![module(ServiceKind::Flights, 2, false)];
        assert_eq!(progress(&modules, 0, false), 67);
    }

    #[test]
    fn test_never_100_while_in_progress() {
        let modules = vec![module(ServiceKind::Hotel, 2, true)];
        assert_eq!(progress(&modules, 0, false), 99);
    }

    #[test]
    fn test_completed_module_out_of_cursor_order_counts_fully() {
        // Hotel added as an optional, already-completed module after the cursor.
        let modules = vec![
            module(ServiceKind::Flights, 0, false),
            module(ServiceKind::Hotel, 2, true),
        ];
        assert_eq!(progress(&modules, 0, false), 40);
    }

    #[test]
    fn test_half_rounds_up() {
        // 1 of 8 steps = 12.5%
        let modules = vec![
            module(ServiceKind::Flights, 1, false),
            module(ServiceKind::Hotel, 0, false),
            module(ServiceKind::Car, 0, false),
            ModuleState { total_steps: 1, ..module(ServiceKind::Activities, 0, false) },
        ];
        assert_eq!(progress(&modules, 0, false), 13);
        // 1 of 2 is exact
        let modules = vec![module(ServiceKind::Hotel, 1, false)];
        assert_eq!(progress(&modules, 0, false), 50);
    }

    #[test]
    fn test_zero_step_modules_do_not_divide_by_zero() {
        let modules = vec![ModuleState { total_steps: 0, ..module(ServiceKind::Car, 0, false) }];
        assert_eq!(progress(&modules, 0, false), 0);
    }

    #[test]
    fn test_flights_then_hotel_scenario() {
        let mut modules = vec![
            module(ServiceKind::Flights, 3, true),
            module(ServiceKind::Hotel, 0, false),
        ];
        assert_eq!(progress(&modules, 1, false), 60);
        modules[1].current_step = 1;
        assert_eq!(progress(&modules, 1, false), 80);
        modules[1].current_step = 2;
        modules[1].completed = true;
        assert_eq!(progress(&modules, 2, true), 100);
    }

    #[test]
    fn test_monotonic_over_a_full_walk() {
        let mut modules = vec![
            module(ServiceKind::Flights, 0, false),
            module(ServiceKind::Car, 0, false),
            module(ServiceKind::Activities, 0, false),
        ];
        let mut cursor = 0;
        let mut last = progress(&modules, cursor, false);
        while cursor < modules.len() {
            modules[cursor].current_step += 1;
            if modules[cursor].current_step == modules[cursor].total_steps {
                modules[cursor].completed = true;
                cursor += 1;
            }
            let completed = cursor == modules.len();
            let p = progress(&modules, cursor, completed);
            assert!(p >= last, "progress went from {last} to {p}");
            assert_eq!(p == 100, completed);
            last = p;
        }
        assert_eq!(last, 100);
    }
}
