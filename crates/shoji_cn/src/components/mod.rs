//! Widget families built on shoji_dom custom elements
//!
//! Each family follows the same pattern:
//! - A root element owning a [`Store`](shoji_core::Store)
//! - Parts that find their root by walking up the tree when connected
//! - Attribute projection from store subscriptions
//! - An `ElementDefinition` per tag, registered by [`define_elements`](crate::define_elements)

pub mod accordion;
pub mod dialog;
pub mod tabs;

use shoji_dom::ElementDefinition;

pub use accordion::{
    Accordion, AccordionContent, AccordionHeader, AccordionItem, AccordionMode, AccordionState,
    AccordionTrigger, AccordionValue, AccordionValueChange, ItemState,
};
pub use dialog::{
    ClosedBy, Dialog, DialogClose, DialogContent, DialogDescription, DialogOutsideTrigger,
    DialogState, DialogTitle, DialogTrigger, OpenChange,
};
pub use tabs::{
    ActivationMode, TabDescriptor, Tabs, TabsList, TabsPanel, TabsState, TabsTrigger,
    TabsValueChange,
};

/// Every element this crate defines
pub fn definitions() -> [ElementDefinition; 16] {
    [
        Accordion::DEFINITION,
        AccordionItem::DEFINITION,
        AccordionHeader::DEFINITION,
        AccordionTrigger::DEFINITION,
        AccordionContent::DEFINITION,
        Dialog::DEFINITION,
        DialogTrigger::DEFINITION,
        DialogOutsideTrigger::DEFINITION,
        DialogClose::DEFINITION,
        DialogContent::DEFINITION,
        DialogTitle::DEFINITION,
        DialogDescription::DEFINITION,
        Tabs::DEFINITION,
        TabsList::DEFINITION,
        TabsTrigger::DEFINITION,
        TabsPanel::DEFINITION,
    ]
}
