//! Unit tests for org-behavior.

use org_agent::{AgentProfile, RoleCatalog};
use org_core::{AgentId, NaiveDate, Role, SimTime};

use crate::{StepContext, TransitionTable};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn monday_at(hour: u32) -> SimTime {
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

fn make_context<'a>(
    catalog:       &'a RoleCatalog,
    transitions:   &'a TransitionTable,
    in_work_hours: bool,
) -> StepContext<'a> {
    StepContext::new(monday_at(9), 1.0, in_work_hours, catalog, transitions)
}

fn sales_profile() -> AgentProfile {
    AgentProfile::new(AgentId(0), "alice", Role::Sales).with_work_intensity(1.3)
}

fn adversary_profile(skill: org_agent::SkillLevel) -> AgentProfile {
    AgentProfile::new(AgentId(9), "mallory", Role::Adversary).with_skill(skill)
}

// ── BenignState ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod state_tests {
    use crate::BenignState;

    #[test]
    fn parse_roundtrip() {
        for state in BenignState::ALL {
            assert_eq!(state.as_str().parse::<BenignState>().unwrap(), state);
        }
        assert_eq!("View-Record".parse::<BenignState>().unwrap(), BenignState::ViewRecord);
        assert!("dance".parse::<BenignState>().is_err());
    }

    #[test]
    fn placeholders_are_not_actionable() {
        assert!(!BenignState::Start.is_actionable());
        assert!(!BenignState::LoggedOut.is_actionable());
        assert!(BenignState::OperatorError.is_actionable());
    }

    #[test]
    fn high_engagement_set() {
        let high: Vec<BenignState> = BenignState::ALL
            .into_iter()
            .filter(|s| s.is_high_engagement())
            .collect();
        assert_eq!(high, [
            BenignState::CreateRecord,
            BenignState::UpdateRecord,
            BenignState::GenerateReport,
            BenignState::ExportData,
        ]);
    }
}

// ── Intent / Action ───────────────────────────────────────────────────────────

#[cfg(test)]
mod intent_tests {
    use org_core::AgentId;

    use crate::{Action, AttackStep, BenignState, Intent};

    #[test]
    fn placeholder_fields() {
        let intent = Intent::placeholder(AgentId(3), BenignState::LoggedOut);
        assert!(!intent.is_actionable());
        assert!(intent.target.is_empty());
        assert_eq!(intent.anomaly_label(), 0);
    }

    #[test]
    fn base_waits_are_positive_for_actionable() {
        for state in crate::BenignState::ALL {
            let action = Action::Benign(state);
            assert_eq!(action.is_actionable(), action.base_wait_minutes() > 0.0);
        }
        assert!(Action::Attack(AttackStep::BulkRead).base_wait_minutes() > 0.0);
    }

    #[test]
    fn display() {
        assert_eq!(Action::Benign(BenignState::Search).to_string(), "benign:search");
        assert_eq!(Action::Attack(AttackStep::Exfiltrate).to_string(), "attack:exfiltrate");
    }
}

// ── TransitionTable ───────────────────────────────────────────────────────────

#[cfg(test)]
mod markov_tests {
    use std::io::Cursor;

    use org_core::Role;

    use crate::{load_transitions_reader, merge_tables, BenignState, TransitionTable};

    #[test]
    fn builtin_covers_every_benign_role() {
        let table = TransitionTable::builtin();
        for role in Role::BENIGN {
            let start = table.row(role, BenignState::Start).unwrap();
            assert_eq!(start, [(BenignState::Login, 1.0)]);
            for state in BenignState::ALL {
                if state.is_actionable() {
                    assert!(table.row(role, state).is_some(), "{role} missing row for {state}");
                }
            }
            assert!(table.row(role, BenignState::LoggedOut).is_none());
        }
        assert!(table.row(Role::Adversary, BenignState::Start).is_none());
        assert!(table.validate().is_ok());
    }

    #[test]
    fn builtin_weights_are_finite_and_non_negative() {
        let table = TransitionTable::builtin();
        for role in Role::BENIGN {
            for state in BenignState::ALL {
                for &(_, w) in table.row(role, state).unwrap_or(&[]) {
                    assert!(w.is_finite() && w >= 0.0);
                }
            }
        }
    }

    #[test]
    fn csv_loads_rows_in_order() {
        let data = "role,from_state,to_state,weight\n\
                    sales,start,login,1.0\n\
                    sales,login,search,0.6\n\
                    sales,login,view_record,0.4\n";
        let table = load_transitions_reader(Cursor::new(data)).unwrap();
        assert_eq!(
            table.row(Role::Sales, BenignState::Login).unwrap(),
            [(BenignState::Search, 0.6), (BenignState::ViewRecord, 0.4)]
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn csv_rejects_bad_rows() {
        let negative = "role,from_state,to_state,weight\nsales,start,login,-1\n";
        assert!(load_transitions_reader(Cursor::new(negative)).is_err());

        let unknown_state = "role,from_state,to_state,weight\nsales,start,lunch,1\n";
        assert!(load_transitions_reader(Cursor::new(unknown_state)).is_err());

        let no_start = "role,from_state,to_state,weight\nsales,login,search,1\n";
        assert!(load_transitions_reader(Cursor::new(no_start)).is_err());

        let adversary = "role,from_state,to_state,weight\nadversary,start,login,1\n";
        assert!(load_transitions_reader(Cursor::new(adversary)).is_err());

        let duplicate = "role,from_state,to_state,weight\nsales,start,login,1\nsales,start,login,2\n";
        assert!(load_transitions_reader(Cursor::new(duplicate)).is_err());
    }

    #[test]
    fn merge_replaces_whole_rows() {
        let mut overrides = TransitionTable::new();
        overrides.insert(Role::Hr, BenignState::Login, BenignState::Idle, 1.0).unwrap();
        let merged = merge_tables(TransitionTable::builtin(), overrides);
        assert_eq!(merged.row(Role::Hr, BenignState::Login).unwrap(), [(BenignState::Idle, 1.0)]);
        assert!(merged.row(Role::Sales, BenignState::Login).unwrap().len() > 1);
    }
}

// ── BenignAgent ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod benign_tests {
    use org_core::{AgentId, AgentRng, Role, SessionId};

    use super::{make_context, sales_profile};
    use crate::{Action, BenignAgent, BenignState, BenignTuning, TransitionTable};
    use org_agent::{AgentProfile, RoleCatalog};

    #[test]
    fn first_step_logs_in() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let ctx = make_context(&catalog, &table, true);
        let mut rng = AgentRng::new(42, AgentId(0));
        let mut agent = BenignAgent::new(sales_profile());

        let intent = agent.step(&ctx, &mut rng);
        assert_eq!(intent.action, Action::Benign(BenignState::Login));
        assert!(intent.is_actionable());
        assert_eq!(intent.anomaly_label(), 0);
        assert!(catalog.resources_for(Role::Sales).contains(&intent.target));
        assert_eq!(intent.param("session_id"), Some("0"));
        assert_eq!(intent.param("sequence"), Some("1"));
        assert!(agent.is_active());
        assert_eq!(agent.session_context().get("last_state").map(String::as_str), Some("login"));
    }

    #[test]
    fn stress_moves_with_work_hours() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let mut rng = AgentRng::new(1, AgentId(0));
        let mut agent = BenignAgent::new(sales_profile());

        agent.set_stress(0.5);
        agent.step(&make_context(&catalog, &table, true), &mut rng);
        assert!((agent.stress() - 0.45).abs() < 1e-9);

        agent.step(&make_context(&catalog, &table, false), &mut rng);
        assert!((agent.stress() - 0.55).abs() < 1e-9);
    }

    #[test]
    fn stress_stays_in_unit_interval() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let mut rng = AgentRng::new(1, AgentId(0));
        let mut agent = BenignAgent::new(sales_profile());
        for _ in 0..30 {
            agent.step(&make_context(&catalog, &table, false), &mut rng);
        }
        assert_eq!(agent.stress(), 1.0);
        assert!(agent.is_fatigued());
        for _ in 0..40 {
            agent.step(&make_context(&catalog, &table, true), &mut rng);
        }
        assert_eq!(agent.stress(), 0.0);
        assert!(!agent.is_fatigued());
    }

    #[test]
    fn fatigue_turns_actions_into_operator_errors() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let mut rng = AgentRng::new(5, AgentId(0));
        let tuning = BenignTuning { operator_error_p: 1.0, ..BenignTuning::default() };
        let mut agent = BenignAgent::with_tuning(sales_profile(), tuning);
        agent.set_stress(0.9);

        let intent = agent.step(&make_context(&catalog, &table, false), &mut rng);
        assert_eq!(intent.action, Action::Benign(BenignState::OperatorError));
        assert!(!intent.is_anomaly);
        // The state machine itself still advanced.
        assert_eq!(agent.state(), BenignState::Login);
    }

    #[test]
    fn repeated_failures_log_out_and_reset_session() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let ctx = make_context(&catalog, &table, true);
        let mut rng = AgentRng::new(3, AgentId(0));
        let mut agent = BenignAgent::new(sales_profile());
        agent.step(&ctx, &mut rng);

        agent.react(false);
        agent.react(false);
        assert!(agent.is_active());
        assert!((agent.frustration() - 0.5).abs() < 1e-9);

        agent.react(false);
        assert_eq!(agent.state(), BenignState::LoggedOut);
        assert!(agent.session_context().is_empty());
        assert_eq!(agent.frustration(), 0.0);

        let next = agent.step(&ctx, &mut rng);
        assert_eq!(next.action, Action::Benign(BenignState::Login));
        assert_eq!(agent.session(), SessionId(1));
        assert_eq!(next.param("session_id"), Some("1"));
    }

    #[test]
    fn success_halves_frustration() {
        let mut agent = BenignAgent::new(sales_profile());
        agent.react(false);
        agent.react(false);
        agent.react(true);
        assert!((agent.frustration() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn force_logout_only_affects_active_agents() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let mut rng = AgentRng::new(3, AgentId(0));
        let mut agent = BenignAgent::new(sales_profile());
        assert!(!agent.force_logout());

        agent.step(&make_context(&catalog, &table, true), &mut rng);
        assert!(agent.force_logout());
        assert_eq!(agent.state(), BenignState::LoggedOut);
        assert!(!agent.force_logout());
    }

    #[test]
    fn missing_row_resets_to_start() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::new();
        let mut rng = AgentRng::new(3, AgentId(0));
        let mut agent = BenignAgent::new(sales_profile());

        let intent = agent.step(&make_context(&catalog, &table, true), &mut rng);
        assert!(!intent.is_actionable());
        assert_eq!(intent.action, Action::Benign(BenignState::Start));
        assert_eq!(agent.state(), BenignState::Start);
    }

    #[test]
    fn work_intensity_scales_high_engagement_weights() {
        let catalog = RoleCatalog::builtin();
        let mut table = TransitionTable::new();
        table.insert(Role::Hr, BenignState::Start, BenignState::Search, 1.0).unwrap();
        table.insert(Role::Hr, BenignState::Start, BenignState::CreateRecord, 1.0).unwrap();

        let profile = AgentProfile::new(AgentId(1), "hank", Role::Hr).with_work_intensity(0.0);
        let mut rng = AgentRng::new(11, AgentId(1));
        for _ in 0..50 {
            let mut agent = BenignAgent::new(profile.clone());
            let intent = agent.step(&make_context(&catalog, &table, true), &mut rng);
            assert_eq!(intent.action, Action::Benign(BenignState::Search));
        }
    }

    #[test]
    fn same_seed_same_trajectory() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let run = || {
            let mut rng = AgentRng::new(77, AgentId(0));
            let mut agent = BenignAgent::new(sales_profile());
            (0..100)
                .map(|_| agent.step(&make_context(&catalog, &table, true), &mut rng).action)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}

// ── AdversarialAgent ──────────────────────────────────────────────────────────

#[cfg(test)]
mod adversary_tests {
    use std::collections::BTreeSet;

    use org_agent::{RoleCatalog, SkillLevel};
    use org_core::{AgentId, AgentRng};

    use super::{adversary_profile, make_context};
    use crate::{Action, AdversarialAgent, AdversaryTuning, AttackChain, TransitionTable};

    #[test]
    fn walks_the_chain_in_order() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let ctx = make_context(&catalog, &table, true);
        let mut rng = AgentRng::new(8, AgentId(9));
        let mut agent = AdversarialAgent::new(adversary_profile(SkillLevel::Novice), &mut rng);

        let chain = agent.chain();
        for &expected in chain.steps() {
            let intent = agent.step(&ctx, &mut rng);
            assert_eq!(intent.action, Action::Attack(expected));
            assert!(intent.is_anomaly);
            let meta = intent.bypass.as_ref().unwrap();
            assert_eq!(meta.technique, chain.technique());
        }
        assert_eq!(agent.step_index(), chain.steps().len());

        agent.step(&ctx, &mut rng);
        assert_eq!(agent.step_index(), 1);
        assert_eq!(agent.chains_started(), 2);
    }

    #[test]
    fn high_value_techniques_hit_only_high_value_resources() {
        let catalog = RoleCatalog::builtin();
        let table = TransitionTable::builtin();
        let ctx = make_context(&catalog, &table, true);
        let mut rng = AgentRng::new(21, AgentId(9));
        let mut agent = AdversarialAgent::new(adversary_profile(SkillLevel::Intermediate), &mut rng);

        let mut saw_high_value = false;
        for _ in 0..500 {
            let intent = agent.step(&ctx, &mut rng);
            let meta = intent.bypass.unwrap();
            if meta.technique.targets_high_value() {
                saw_high_value = true;
                assert!(catalog.high_value_resources().contains(&intent.target));
            } else {
                assert!(catalog.all_resources().contains(&intent.target));
            }
        }
        assert!(saw_high_value);
    }

    #[test]
    fn failure_records_detection_and_raises_avoidance() {
        let mut rng = AgentRng::new(2, AgentId(9));
        let mut agent = AdversarialAgent::new(adversary_profile(SkillLevel::Novice), &mut rng);
        let technique = agent.chain().technique();

        agent.react(false, &mut rng);
        assert!(agent.detected_techniques().contains(&technique));
        assert!((agent.detection_avoidance() - 0.15).abs() < 1e-9);

        for _ in 0..20 {
            agent.react(false, &mut rng);
        }
        assert_eq!(agent.detection_avoidance(), 1.0);
    }

    #[test]
    fn only_advanced_attackers_switch_on_failure() {
        let tuning = AdversaryTuning { switch_on_failure_p: 1.0, ..AdversaryTuning::default() };
        let mut rng = AgentRng::new(4, AgentId(9));

        let mut novice = AdversarialAgent::with_tuning(adversary_profile(SkillLevel::Novice), tuning, &mut rng);
        novice.react(false, &mut rng);
        assert_eq!(novice.chains_started(), 1);

        let mut advanced = AdversarialAgent::with_tuning(adversary_profile(SkillLevel::Advanced), tuning, &mut rng);
        advanced.react(false, &mut rng);
        assert_eq!(advanced.chains_started(), 2);
        assert_eq!(advanced.step_index(), 0);
    }

    #[test]
    fn success_records_bypass_and_may_drop_obfuscation() {
        let tuning = AdversaryTuning { drop_obfuscation_p: 1.0, ..AdversaryTuning::default() };
        let mut rng = AgentRng::new(4, AgentId(9));
        let mut agent = AdversarialAgent::with_tuning(adversary_profile(SkillLevel::Advanced), tuning, &mut rng);
        assert!(agent.is_obfuscating());

        agent.react(true, &mut rng);
        assert!(agent.successful_bypasses().contains(&agent.chain().technique()));
        assert!(!agent.is_obfuscating());
    }

    #[test]
    fn novices_start_without_obfuscation() {
        let mut rng = AgentRng::new(4, AgentId(9));
        let agent = AdversarialAgent::new(adversary_profile(SkillLevel::Novice), &mut rng);
        assert!(!agent.is_obfuscating());
    }

    #[test]
    fn prefers_the_undetected_chain() {
        let tuning = AdversaryTuning { prefer_undetected_p: 1.0, ..AdversaryTuning::default() };
        let mut rng = AgentRng::new(6, AgentId(9));
        let mut agent = AdversarialAgent::with_tuning(adversary_profile(SkillLevel::Novice), tuning, &mut rng);
        for chain in AttackChain::ALL {
            if chain != AttackChain::SchemaDiscovery {
                agent.mark_detected(chain.technique());
            }
        }
        for _ in 0..100 {
            assert_eq!(agent.choose_next_chain(&mut rng), AttackChain::SchemaDiscovery);
        }
    }

    #[test]
    fn fully_detected_draws_from_every_chain() {
        let mut rng = AgentRng::new(6, AgentId(9));
        let mut agent = AdversarialAgent::new(adversary_profile(SkillLevel::Novice), &mut rng);
        for chain in AttackChain::ALL {
            agent.mark_detected(chain.technique());
        }
        let mut counts = [0u32; 6];
        for _ in 0..6_000 {
            let chain = agent.choose_next_chain(&mut rng);
            let idx = AttackChain::ALL.iter().position(|&c| c == chain).unwrap();
            counts[idx] += 1;
        }
        // Uniform: 1000 expected per chain.
        assert!(counts.iter().all(|&n| (800..=1200).contains(&n)), "{counts:?}");
    }

    #[test]
    fn chains_map_one_to_one_onto_techniques() {
        let techniques: BTreeSet<_> = AttackChain::ALL.iter().map(|c| c.technique()).collect();
        assert_eq!(techniques.len(), AttackChain::ALL.len());
        assert!(AttackChain::ALL.iter().all(|c| !c.steps().is_empty()));
    }

    #[test]
    fn stealth_means_low_and_slow() {
        let mut rng = AgentRng::new(6, AgentId(9));
        let agent = AdversarialAgent::new(adversary_profile(SkillLevel::Novice).with_stealth(true), &mut rng);
        assert!(agent.is_low_and_slow());
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod agent_tests {
    use org_agent::SkillLevel;

    use super::{adversary_profile, sales_profile};
    use crate::Agent;
    use org_core::{AgentId, AgentRng};

    #[test]
    fn from_profile_picks_variant() {
        let mut rng = AgentRng::new(0, AgentId(0));
        assert!(!Agent::from_profile(sales_profile(), &mut rng).is_adversarial());
        let adversary = Agent::from_profile(adversary_profile(SkillLevel::Advanced), &mut rng);
        assert!(adversary.is_adversarial());
        assert!(adversary.is_active());
        assert_eq!(adversary.id(), AgentId(9));
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use org_agent::{AgentProfile, RoleCatalog};
    use org_core::{AgentId, AgentRng, Role};

    use super::make_context;
    use crate::{BenignAgent, TransitionTable};

    proptest! {
        #[test]
        fn benign_intents_stay_inside_role_permissions(
            seed in any::<u64>(),
            role_idx in 0usize..7,
            in_hours in any::<bool>(),
        ) {
            let role = Role::BENIGN[role_idx];
            let catalog = RoleCatalog::builtin();
            let table = TransitionTable::builtin();
            let ctx = make_context(&catalog, &table, in_hours);
            let mut rng = AgentRng::new(seed, AgentId(0));
            let mut agent = BenignAgent::new(AgentProfile::new(AgentId(0), "p", role));

            for _ in 0..50 {
                let intent = agent.step(&ctx, &mut rng);
                prop_assert!(!intent.is_anomaly);
                if intent.is_actionable() {
                    prop_assert!(catalog.resources_for(role).contains(&intent.target));
                } else {
                    prop_assert!(intent.target.is_empty());
                }
                prop_assert!((0.0..=1.0).contains(&agent.stress()));
            }
        }
    }
}
