//! Keypads (inline and chat) and their buttons, serialized to the Bot API wire shape.

use serde::{Deserialize, Serialize};

use crate::types::Location;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonType {
    #[default]
    Simple,
    Selection,
    Calendar,
    NumberPicker,
    StringPicker,
    Location,
    CameraImage,
    CameraVideo,
    GalleryImage,
    GalleryVideo,
    File,
    Audio,
    RecordAudio,
    Textbox,
    Link,
    AskMyPhoneNumber,
    AskMyLocation,
    Barcode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionItemType {
    #[default]
    TextOnly,
    TextImgThu,
    TextImgBig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionSearchType {
    #[default]
    None,
    Local,
    Api,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionGetType {
    #[default]
    Local,
    Api,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarType {
    #[default]
    DatePersian,
    DateGregorian,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextboxLineType {
    #[default]
    SingleLine,
    MultiLine,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextboxKeypadType {
    #[default]
    String,
    Number,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationPickerType {
    #[default]
    Picker,
    View,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSelectionItem {
    pub text: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(rename = "type", default)]
    pub item_type: SelectionItemType,
}

impl ButtonSelectionItem {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSelection {
    pub selection_id: String,
    pub search_type: SelectionSearchType,
    pub get_type: SelectionGetType,
    pub items: Vec<ButtonSelectionItem>,
    pub is_multi_selection: bool,
    pub columns_count: String,
    pub title: String,
}

impl ButtonSelection {
    pub fn new(selection_id: impl Into<String>, items: Vec<ButtonSelectionItem>) -> Self {
        Self {
            selection_id: selection_id.into(),
            search_type: SelectionSearchType::None,
            get_type: SelectionGetType::Local,
            items,
            is_multi_selection: false,
            columns_count: "1".to_string(),
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonCalendar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(rename = "type")]
    pub calendar_type: CalendarType,
    pub min_year: String,
    pub max_year: String,
    pub title: String,
}

impl Default for ButtonCalendar {
    fn default() -> Self {
        Self {
            default_value: None,
            calendar_type: CalendarType::DatePersian,
            min_year: "1300".to_string(),
            max_year: "1500".to_string(),
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonNumberPicker {
    pub min_value: String,
    pub max_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub title: String,
}

impl Default for ButtonNumberPicker {
    fn default() -> Self {
        Self {
            min_value: "0".to_string(),
            max_value: "100".to_string(),
            default_value: None,
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonStringPicker {
    pub items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pointer_location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_map_location: Option<Location>,
    #[serde(rename = "type")]
    pub location_type: LocationPickerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub location_image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonTextbox {
    pub type_line: TextboxLineType,
    pub type_keypad: TextboxKeypadType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// One button. Only the option payload matching `button_type` is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    #[serde(rename = "type")]
    pub button_type: ButtonType,
    pub button_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_selection: Option<ButtonSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_calendar: Option<ButtonCalendar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_number_picker: Option<ButtonNumberPicker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_string_picker: Option<ButtonStringPicker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_location: Option<ButtonLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_textbox: Option<ButtonTextbox>,
}

impl Button {
    pub fn simple(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::of_type(id, ButtonType::Simple, text)
    }

    /// A button with no option payload (camera, gallery, link, ask-phone ...).
    pub fn of_type(id: impl Into<String>, button_type: ButtonType, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            button_type,
            button_text: text.into(),
            ..Self::default()
        }
    }

    pub fn selection(id: impl Into<String>, text: impl Into<String>, selection: ButtonSelection) -> Self {
        Self {
            button_selection: Some(selection),
            ..Self::of_type(id, ButtonType::Selection, text)
        }
    }

    pub fn calendar(id: impl Into<String>, text: impl Into<String>, calendar: ButtonCalendar) -> Self {
        Self {
            button_calendar: Some(calendar),
            ..Self::of_type(id, ButtonType::Calendar, text)
        }
    }

    pub fn number_picker(
        id: impl Into<String>,
        text: impl Into<String>,
        picker: ButtonNumberPicker,
    ) -> Self {
        Self {
            button_number_picker: Some(picker),
            ..Self::of_type(id, ButtonType::NumberPicker, text)
        }
    }

    pub fn string_picker(
        id: impl Into<String>,
        text: impl Into<String>,
        picker: ButtonStringPicker,
    ) -> Self {
        Self {
            button_string_picker: Some(picker),
            ..Self::of_type(id, ButtonType::StringPicker, text)
        }
    }

    pub fn location(id: impl Into<String>, text: impl Into<String>, location: ButtonLocation) -> Self {
        Self {
            button_location: Some(location),
            ..Self::of_type(id, ButtonType::Location, text)
        }
    }

    pub fn textbox(id: impl Into<String>, text: impl Into<String>, textbox: ButtonTextbox) -> Self {
        Self {
            button_textbox: Some(textbox),
            ..Self::of_type(id, ButtonType::Textbox, text)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypadRow {
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypad {
    pub rows: Vec<KeypadRow>,
    pub resize_keyboard: bool,
    pub on_time_keyboard: bool,
}

impl Keypad {
    pub fn from_rows(rows: Vec<Vec<Button>>) -> Self {
        Self {
            rows: rows.into_iter().map(|buttons| KeypadRow { buttons }).collect(),
            resize_keyboard: true,
            on_time_keyboard: false,
        }
    }

    /// Keypad of simple buttons from `(id, text)` rows.
    pub fn simple<R, B, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = B>,
        B: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self::from_rows(
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(id, text)| Button::simple(id, text))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.buttons.is_empty())
    }
}
