use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::JsonSchema;

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct PedalConfig {
    /// Behavior after power-on and after a reset command
    pub mode: PedalMode,
    /// Engage on release instead of press
    #[serde(default)]
    pub inverted: bool,
    /// Disabled pedals produce no actions
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PedalMode {
    None,
    /// Hold left mouse button
    MouseLeft,
    /// Hold right mouse button
    MouseRight,
    /// Hold middle mouse button
    MouseMiddle,
    /// Double click left mouse button
    MouseDouble,
    CtrlClick,
    ShiftClick,
    ShiftMiddleClick,
    /// Hold F18
    ScrollBar,
    /// Hold F20
    ScrollAnywhere,
    /// Hold F21
    Function,
    /// Hold F22
    Orbit,
    /// Hold the key combination configured over the serial protocol
    KeyCombo,
}

impl ToTokens for PedalMode {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let variant = Ident::new(&format!("{:?}", self), Span::call_site());
        tokens.append_all(quote! {
            crate::pedal::PedalMode::#variant
        })
    }
}

impl ToTokens for PedalConfig {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let PedalConfig { mode, inverted, enabled } = self;
        tokens.append_all(quote! {
            crate::config::PedalDefaults {
                mode: #mode,
                inverted: #inverted,
                enabled: #enabled,
            }
        })
    }
}
