//! IPv4 subnet arithmetic, equivalent to Terraform's `cidrsubnet(base, 8, n)`.

use crate::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrBlock {
    base: u32,
    prefix: u8,
}

impl CidrBlock {
    pub fn parse(text: &str) -> Result<Self, RenderError> {
        let err = |reason: &str| RenderError::Cidr { cidr: text.to_string(), reason: reason.to_string() };

        let (addr, prefix) = text.split_once('/').ok_or_else(|| err("missing prefix length"))?;
        let prefix: u8 = prefix.parse().map_err(|_| err("prefix is not a number"))?;
        if prefix > 30 {
            return Err(err("prefix longer than /30"));
        }

        let mut base: u32 = 0;
        let mut octets = 0;
        for part in addr.split('.') {
            let octet: u32 = part.parse().map_err(|_| err("octet is not a number"))?;
            if octet > 255 {
                return Err(err("octet above 255"));
            }
            base = (base << 8) | octet;
            octets += 1;
        }
        if octets != 4 {
            return Err(err("expected four octets"));
        }

        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        Ok(Self { base: base & mask, prefix })
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Child block `index` after extending the prefix by `newbits`.
    pub fn subnet(&self, newbits: u8, index: u32) -> Result<String, RenderError> {
        let child_prefix = u32::from(self.prefix) + u32::from(newbits);
        if child_prefix > 30 {
            return Err(RenderError::Cidr {
                cidr: self.to_string(),
                reason: format!("cannot carve /{child_prefix} subnets"),
            });
        }
        if index >= (1u32 << newbits) {
            return Err(RenderError::Cidr {
                cidr: self.to_string(),
                reason: format!("subnet index {index} does not fit in {newbits} new bits"),
            });
        }
        let child = self.base | (index << (32 - child_prefix));
        Ok(format!(
            "{}.{}.{}.{}/{}",
            child >> 24,
            (child >> 16) & 0xff,
            (child >> 8) & 0xff,
            child & 0xff,
            child_prefix
        ))
    }
}

impl std::fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}/{}",
            self.base >> 24,
            (self.base >> 16) & 0xff,
            (self.base >> 8) & 0xff,
            self.base & 0xff,
            self.prefix
        )
    }
}
