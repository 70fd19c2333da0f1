/// Column names of the backing sheet, in storage order. Row 1 always holds these.
pub const HEADERS: [&str; 11] = [
    "data_hora",
    "nome",
    "email",
    "telefone",
    "cep",
    "logradouro",
    "bairro",
    "cidade",
    "uf",
    "numero",
    "complemento",
];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 1-based row index in the backing sheet. Position 1 is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(pub u32);

impl Position {
    pub const HEADER: Position = Position(1);
    pub const FIRST_RECORD: Position = Position(2);
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
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

impl Record {
    /// Cells in [`HEADERS`] order.
    pub fn to_row(&self) -> [&str; 11] {
        [
            self.timestamp.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.postal_code.as_str(),
            self.street.as_str(),
            self.neighborhood.as_str(),
            self.city.as_str(),
            self.region.as_str(),
            self.number.as_str(),
            self.complement.as_str(),
        ]
    }

    /// Builds a record from cells in [`HEADERS`] order; missing trailing cells are empty.
    pub fn from_row(cells: &[String]) -> Self {
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
        Record {
            timestamp: cell(0),
            name: cell(1),
            email: cell(2),
            phone: cell(3),
            postal_code: cell(4),
            street: cell(5),
            neighborhood: cell(6),
            city: cell(7),
            region: cell(8),
            number: cell(9),
            complement: cell(10),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.to_row().iter().all(|cell| cell.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub record: Record,
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
}

pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}
