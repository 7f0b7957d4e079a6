//! The formula subset the ledger writes: `=SUM(E5:G5)`, `=SUM(H5:H)`,
//! `=C2 - D2 - E2`, decimal literals, unary minus and parentheses.
//!
//! Formulas are stored as text and evaluated on read.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::a1::{column_index, CellRef, GridRange};
use crate::value::CellValue;

/// Nesting limit for formula cells that reference other formula cells.
pub(crate) const MAX_DEPTH: u8 = 64;

pub const ERROR_PARSE: &str = "#ERROR!";
pub const ERROR_VALUE: &str = "#VALUE!";
pub const ERROR_CYCLE: &str = "#CYCLE!";
pub const ERROR_NUM: &str = "#NUM!";

/// Read access to evaluated cells, implemented by the sheet model.
pub(crate) trait Grid {
    fn evaluated(&self, row: u32, col: u32, depth: u8) -> CellValue;
    fn content_last_row(&self) -> u32;
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Ref(CellRef),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Sum(Vec<Arg>),
}

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Range(GridRange),
    Expr(Expr),
}

/// Evaluate `formula` against `grid`. Never fails: problems surface as an
/// error value, the way a spreadsheet shows them in the cell.
pub(crate) fn evaluate<G: Grid + ?Sized>(grid: &G, formula: &str, depth: u8) -> CellValue {
    if depth > MAX_DEPTH {
        return CellValue::Error(ERROR_CYCLE.to_owned());
    }
    let Some(expr) = Parser::new(formula).parse() else {
        return CellValue::Error(ERROR_PARSE.to_owned());
    };
    match eval(grid, &expr, depth) {
        Ok(n) => CellValue::Number(n),
        Err(code) => CellValue::Error(code),
    }
}

fn eval<G: Grid + ?Sized>(grid: &G, expr: &Expr, depth: u8) -> Result<Decimal, String> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(cell) => match grid.evaluated(cell.row, cell.col, depth + 1) {
            CellValue::Empty => Ok(Decimal::ZERO),
            CellValue::Number(n) => Ok(n),
            CellValue::Text(s) if s.is_empty() => Ok(Decimal::ZERO),
            CellValue::Error(code) => Err(code),
            CellValue::Text(_) | CellValue::DateTime(_) => Err(ERROR_VALUE.to_owned()),
        },
        Expr::Neg(inner) => Ok(-eval(grid, inner, depth)?),
        Expr::Add(a, b) => checked(eval(grid, a, depth)?.checked_add(eval(grid, b, depth)?)),
        Expr::Sub(a, b) => checked(eval(grid, a, depth)?.checked_sub(eval(grid, b, depth)?)),
        Expr::Sum(args) => {
            let mut total = Decimal::ZERO;
            for arg in args {
                let part = match arg {
                    Arg::Expr(e) => eval(grid, e, depth)?,
                    Arg::Range(range) => sum_range(grid, range, depth)?,
                };
                total = checked(total.checked_add(part))?;
            }
            Ok(total)
        }
    }
}

/// Numbers are summed; text, dates and blanks are ignored; errors propagate.
fn sum_range<G: Grid + ?Sized>(grid: &G, range: &GridRange, depth: u8) -> Result<Decimal, String> {
    let end_row = range.resolved_end_row(grid.content_last_row());
    let mut total = Decimal::ZERO;
    for row in range.start_row..=end_row {
        for col in range.start_col..=range.end_col {
            match grid.evaluated(row, col, depth + 1) {
                CellValue::Number(n) => total = checked(total.checked_add(n))?,
                CellValue::Error(code) => return Err(code),
                _ => {}
            }
        }
    }
    Ok(total)
}

fn checked(value: Option<Decimal>) -> Result<Decimal, String> {
    value.ok_or_else(|| ERROR_NUM.to_owned())
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(formula: &str) -> Self {
        let body = formula.trim().strip_prefix('=').unwrap_or(formula.trim());
        Self {
            chars: body.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Option<Expr> {
        let expr = self.expr()?;
        self.skip_ws();
        (self.pos == self.chars.len()).then_some(expr)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Option<Expr> {
        let mut lhs = self.term()?;
        loop {
            if self.eat('+') {
                lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
            } else if self.eat('-') {
                lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
            } else {
                return Some(lhs);
            }
        }
    }

    fn term(&mut self) -> Option<Expr> {
        if self.eat('-') {
            return Some(Expr::Neg(Box::new(self.term()?)));
        }
        if self.eat('+') {
            return self.term();
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Expr> {
        self.skip_ws();
        let c = self.peek()?;
        if c == '(' {
            self.pos += 1;
            let inner = self.expr()?;
            return self.eat(')').then_some(inner);
        }
        if c.is_ascii_digit() || c == '.' {
            return self.number();
        }

        let (letters, row) = self.reference_parts();
        match row {
            Some(row) => Some(Expr::Ref(CellRef::new(row, column_index(&letters)?))),
            None if self.eat('(') => self.function(&letters),
            None => None,
        }
    }

    fn number(&mut self) -> Option<Expr> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Decimal::from_str(&text).ok().map(Expr::Number)
    }

    /// Reads `$?LETTERS$?DIGITS?`. Returns the letters and the row, if any.
    fn reference_parts(&mut self) -> (String, Option<u32>) {
        let mut letters = String::new();
        let mut digits = String::new();
        if self.peek() == Some('$') {
            self.pos += 1;
        }
        while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
            letters.push(c.to_ascii_uppercase());
            self.pos += 1;
        }
        if self.peek() == Some('$') {
            self.pos += 1;
        }
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.pos += 1;
        }
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0);
        (letters, row)
    }

    fn function(&mut self, name: &str) -> Option<Expr> {
        // SUM is the only function the ledger writes.
        if name != "SUM" {
            return None;
        }
        let mut args = Vec::new();
        if self.eat(')') {
            return Some(Expr::Sum(args));
        }
        loop {
            args.push(self.argument()?);
            if self.eat(')') {
                return Some(Expr::Sum(args));
            }
            if !self.eat(',') {
                return None;
            }
        }
    }

    fn argument(&mut self) -> Option<Arg> {
        let checkpoint = self.pos;
        self.skip_ws();
        let (letters, row) = self.reference_parts();
        if let Some(row) = row {
            if self.eat(':') {
                self.skip_ws();
                let (end_letters, end_row) = self.reference_parts();
                let start = CellRef::new(row, column_index(&letters)?);
                let end_col = column_index(&end_letters)?;
                let range = match end_row {
                    Some(end_row) => GridRange {
                        start_row: start.row.min(end_row),
                        start_col: start.col.min(end_col),
                        end_row: Some(start.row.max(end_row)),
                        end_col: start.col.max(end_col),
                    },
                    None => GridRange::open(start.row, start.col.min(end_col), start.col.max(end_col)),
                };
                return Some(Arg::Range(range));
            }
        }
        self.pos = checkpoint;
        self.expr().map(Arg::Expr)
    }
}

static CELL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_$])(\$?[A-Za-z]{1,3})(\$?)([0-9]+)")
        .expect("cell reference pattern is valid")
});

/// Move every relative row reference in `formula` by `delta` rows, as happens
/// when a sort relocates the row holding the formula. Absolute rows (`$5`)
/// stay put; open column ranges (`H5:H`) keep their open end.
#[must_use]
pub fn shift_rows(formula: &str, delta: i64) -> String {
    if delta == 0 {
        return formula.to_owned();
    }
    CELL_REF
        .replace_all(formula, |caps: &regex::Captures<'_>| {
            let row_text = &caps[4];
            let shifted = if caps[3].is_empty() {
                row_text
                    .parse::<i64>()
                    .ok()
                    .map(|row| (row + delta).max(1))
                    .map_or_else(|| row_text.to_owned(), |row| row.to_string())
            } else {
                row_text.to_owned()
            };
            format!("{}{}{}{}", &caps[1], &caps[2], &caps[3], shifted)
        })
        .into_owned()
}
