use crate::domain::entities::record::{only_digits, Address, Record};

pub const POSTAL_CODE_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    PostalCode,
    Street,
    Neighborhood,
    City,
    Region,
    Number,
    Complement,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::PostalCode,
        Field::Street,
        Field::Neighborhood,
        Field::City,
        Field::Region,
        Field::Number,
        Field::Complement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Nome *",
            Field::Email => "E-mail *",
            Field::Phone => "Telefone",
            Field::PostalCode => "CEP * (somente números)",
            Field::Street => "Logradouro",
            Field::Neighborhood => "Bairro",
            Field::City => "Cidade",
            Field::Region => "UF",
            Field::Number => "Número *",
            Field::Complement => "Complemento",
        }
    }

    pub fn max_length(self) -> Option<usize> {
        match self {
            Field::Region => Some(2),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Nome é obrigatório.")]
    MissingName,
    #[error("E-mail é obrigatório.")]
    MissingEmail,
    #[error("CEP inválido. Informe 8 dígitos.")]
    InvalidPostalCode,
    #[error("Número é obrigatório.")]
    MissingNumber,
}

/// Raw text of the form inputs, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub number: String,
    pub complement: String,
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::PostalCode => &self.postal_code,
            Field::Street => &self.street,
            Field::Neighborhood => &self.neighborhood,
            Field::City => &self.city,
            Field::Region => &self.region,
            Field::Number => &self.number,
            Field::Complement => &self.complement,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::PostalCode => &mut self.postal_code,
            Field::Street => &mut self.street,
            Field::Neighborhood => &mut self.neighborhood,
            Field::City => &mut self.city,
            Field::Region => &mut self.region,
            Field::Number => &mut self.number,
            Field::Complement => &mut self.complement,
        };
        *slot = value;
    }

    pub fn from_record(record: &Record) -> Self {
        FormFields {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            postal_code: record.postal_code.clone(),
            street: record.street.clone(),
            neighborhood: record.neighborhood.clone(),
            city: record.city.clone(),
            region: record.region.clone(),
            number: record.number.clone(),
            complement: record.complement.clone(),
        }
    }

    pub fn fill_address(&mut self, address: &Address) {
        self.street = address.street.clone();
        self.neighborhood = address.neighborhood.clone();
        self.city = address.city.clone();
        self.region = address.region.clone();
    }

    /// Checks the required fields in order and reports the first one that fails.
    pub fn validate(&self) -> Result<RecordDraft, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        let postal_code = only_digits(&self.postal_code);
        if postal_code.len() != POSTAL_CODE_DIGITS {
            return Err(ValidationError::InvalidPostalCode);
        }
        if self.number.trim().is_empty() {
            return Err(ValidationError::MissingNumber);
        }

        Ok(RecordDraft {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            postal_code,
            street: self.street.trim().to_string(),
            neighborhood: self.neighborhood.trim().to_string(),
            city: self.city.trim().to_string(),
            region: self.region.trim().to_uppercase(),
            number: self.number.trim().to_string(),
            complement: self.complement.trim().to_string(),
        })
    }
}

/// Validated, normalized form contents waiting for a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub number: String,
    pub complement: String,
}

impl RecordDraft {
    pub fn stamp(self, timestamp: String) -> Record {
        Record {
            timestamp,
            name: self.name,
            email: self.email,
            phone: self.phone,
            postal_code: self.postal_code,
            street: self.street,
            neighborhood: self.neighborhood,
            city: self.city,
            region: self.region,
            number: self.number,
            complement: self.complement,
        }
    }
}
