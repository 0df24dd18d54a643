mod redemptions;
mod waste_entries;
