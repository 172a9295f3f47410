pub struct ApiKeyForm {
    pub api_key: String,
    pub api_base_url: String,
    pub selected_field: Field,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    ApiKey,
    ApiBaseUrl,
}

impl Default for ApiKeyForm {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: String::new(),
            selected_field: Field::ApiKey,
        }
    }
}

impl ApiKeyForm {
    pub fn toggle_field(&mut self) {
        self.selected_field = match self.selected_field {
            Field::ApiKey => Field::ApiBaseUrl,
            Field::ApiBaseUrl => Field::ApiKey,
        };
    }

    pub fn current_field_value(&mut self) -> &mut String {
        match self.selected_field {
            Field::ApiKey => &mut self.api_key,
            Field::ApiBaseUrl => &mut self.api_base_url,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn masked_key(&self) -> String {
        "*".repeat(self.api_key.chars().count().min(24))
    }

    /// The base URL to send, if one was entered.
    pub fn base_url(&self) -> Option<&str> {
        Some(self.api_base_url.trim()).filter(|s| !s.is_empty())
    }
}
