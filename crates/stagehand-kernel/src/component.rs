//! The component trait and its registry slot.

use std::any::Any;

use stagehand_core::enums::ComponentPriority;
use stagehand_core::message::Message;

use crate::context::GmContext;

/// A priority-ordered listener registered with the game manager.
///
/// Components see every processed message before any actor does, in
/// priority order (stable within a priority band). A transport component
/// additionally overrides [`GmComponent::dispatch_network_message`] to
/// forward network-bound traffic.
pub trait GmComponent: Any + Send {
    /// Unique name, used for lookup and removal.
    fn name(&self) -> &str;

    /// Called when the component is added to the game manager.
    fn on_added_to_gm(&mut self, _ctx: &mut GmContext<'_>) {}

    /// Called when the component is removed from the game manager.
    fn on_removed_from_gm(&mut self, _ctx: &mut GmContext<'_>) {}

    /// Called for every processed message.
    fn process_message(&mut self, ctx: &mut GmContext<'_>, msg: &Message);

    /// Called for messages bound for the network.
    fn dispatch_network_message(&mut self, _ctx: &mut GmContext<'_>, _msg: &Message) {}
}

/// One slot of the ordered component list.
///
/// Removal tombstones the slot; the dispatch walk sweeps tombstones on its
/// next pass, so removal during dispatch never shifts live indices.
pub(crate) struct ComponentSlot {
    pub name: String,
    pub priority: ComponentPriority,
    pub removed: bool,
    /// Taken out while the component's handler is running.
    pub component: Option<Box<dyn GmComponent>>,
}
