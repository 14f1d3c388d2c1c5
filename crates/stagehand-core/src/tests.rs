#[cfg(test)]
mod tests {
    use crate::constants::{DT, TICK_RATE};
    use crate::enums::{ActorState, ComponentPriority, MessageType};
    use crate::ids::{ActorId, MachineInfo};
    use crate::message::{Message, MessagePayload};
    use crate::types::GameClock;

    #[test]
    fn test_priority_order_ids_ascend() {
        let priorities = [
            ComponentPriority::Highest,
            ComponentPriority::Higher,
            ComponentPriority::Normal,
            ComponentPriority::Lower,
            ComponentPriority::Lowest,
        ];
        for pair in priorities.windows(2) {
            assert!(pair[0].order_id() < pair[1].order_id());
        }
        assert_eq!(ComponentPriority::default(), ComponentPriority::Normal);
    }

    #[test]
    fn test_message_type_categories() {
        assert_eq!(MessageType::TickLocal.category(), "Tick");
        assert_eq!(MessageType::ActorDeleted.category(), "Info");
        assert_eq!(MessageType::CommandPause.category(), "Command");
        assert_eq!(MessageType::RequestSetTime.category(), "Request");
        assert_eq!(MessageType::ServerRequestRejected.category(), "Server");
    }

    #[test]
    fn test_end_of_frame_is_components_only() {
        assert!(MessageType::TickEndOfFrame.components_only());
        assert!(!MessageType::TickLocal.components_only());
        assert!(!MessageType::GameEvent.components_only());
    }

    /// Every message type must construct with a payload of its own family.
    #[test]
    fn test_default_payload_pairing() {
        let machine = MachineInfo::new("test");
        let tick = Message::new(MessageType::TickRemote, machine.id);
        assert!(tick.tick().is_some());

        let timer = Message::new(MessageType::TimerElapsed, machine.id);
        assert!(matches!(
            timer.payload(),
            MessagePayload::TimerElapsed { .. }
        ));

        let created = Message::new(MessageType::ActorCreated, machine.id);
        assert!(matches!(created.payload(), MessagePayload::ActorUpdate { .. }));

        let rejected = Message::new(MessageType::ServerRequestRejected, machine.id);
        assert!(matches!(rejected.payload(), MessagePayload::Rejected { .. }));

        let paused = Message::new(MessageType::Paused, machine.id);
        assert!(matches!(paused.payload(), MessagePayload::Empty));
    }

    #[test]
    fn test_message_builder_fields() {
        let machine = MachineInfo::new("test");
        let about = ActorId::generate();
        let sender = ActorId::generate();

        let msg = Message::new(MessageType::GameEvent, machine.id)
            .with_payload(MessagePayload::GameEvent {
                event: "breach".into(),
            })
            .about(about)
            .from_actor(sender)
            .to_machine(machine.id);

        assert_eq!(msg.message_type(), MessageType::GameEvent);
        assert_eq!(msg.about_actor(), Some(about));
        assert_eq!(msg.sending_actor(), Some(sender));
        assert_eq!(msg.destination(), Some(machine.id));
        assert!(msg.causing().is_none());
    }

    /// The payload union serializes with an internal tag, so transports see
    /// a stable `"type"` discriminant.
    #[test]
    fn test_payload_serde_tagged() {
        let machine = MachineInfo::new("test");
        let msg = Message::new(MessageType::TimerElapsed, machine.id).with_payload(
            MessagePayload::TimerElapsed {
                timer_name: "patrol-report".into(),
                late_time: 0.25,
            },
        );

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"TimerElapsed\""));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_clock_advance_and_scale() {
        let mut clock = GameClock::default();
        clock.time_scale = 2.0;

        let tick = clock.advance(DT);
        assert!((tick.delta_sim_time - DT * 2.0).abs() < 1e-12);
        assert!((clock.sim_time - DT * 2.0).abs() < 1e-12);
        assert!((clock.real_time - DT).abs() < 1e-12);
    }

    #[test]
    fn test_clock_paused_freezes_sim_time() {
        let mut clock = GameClock::default();
        clock.advance(1.0);
        clock.paused = true;

        let tick = clock.advance(1.0);
        assert_eq!(tick.delta_sim_time, 0.0);
        assert!((clock.sim_time - 1.0).abs() < 1e-12);
        assert!((clock.real_time - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tick_rate_constants_agree() {
        assert!((DT * TICK_RATE as f64 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_actor_id_nil() {
        assert!(ActorId::nil().is_nil());
        assert!(!ActorId::generate().is_nil());
        assert_ne!(ActorId::generate(), ActorId::generate());
    }

    #[test]
    fn test_actor_state_default_is_created() {
        assert_eq!(ActorState::default(), ActorState::Created);
    }
}
