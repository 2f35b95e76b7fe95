//! Field titles of each report section, in column order

pub const GENERAL_INFO_TITLES: &[&str] = &[
    "Lowest Estimated Value",
    "Activity",
    "Parcel Number",
    "Owner",
    "Mailing Address",
    "Phone Number",
    "Owner Occupied",
    "Time Owned",
];

/// Also the labels searched for in the house-features block
pub const HOUSE_FEATURE_TITLES: &[&str] = &[
    "Property Type",
    "Bedrooms*",
    "Total Baths",
    "Full Baths*",
    "Building Area (sq ft)",
    "Living Area (sq ft)*",
    "Garage (spaces)",
    "Year Built*",
];

pub const DEED_TITLES: &[&str] = &[
    "Document #",
    "Adjustable Rate Index",
    "Loan Amount (2nd TD)",
    "Contract Date",
    "Seller Name",
    "Rate Change Frequency",
    "Due Date",
    "Inter-family Transfer",
    "Buyer Mailing Address",
    "Construction Loan",
    "Title Company Name",
    "Buyer Name",
    "Buyer ID",
    "Buyer Vesting",
    "Recording Date",
    "Change Index",
    "Prepayment Penalty Rider (Term)",
    "Loan Amount",
    "Interest Rate",
    "Sale Price",
    "Prepayment Rider",
    "Lender Name",
    "Seller ID",
    "Loan Type",
    "Max Interest Rate",
    "Document Type",
];

pub const MORTGAGE_TITLES: &[&str] = &[
    "Document #",
    "Loan Term Year",
    "Record Type",
    "Contract Date",
    "Rate Change Freq",
    "Due Date",
    "Page Number",
    "Borrower 2 ID",
    "Equity Credit Line",
    "Title Company Name",
    "Construction Loan",
    "Interest Rate (Not Less)",
    "Mailing Address",
    "Type of Financing",
    "Borrower Mailing Address",
    "DBA Name",
    "Recording Date",
    "Change Index",
    "Prepayment Penalty Rider (Term)",
    "Loan Amount",
    "Lender Type",
    "Interest Rate",
    "Prepayment Rider",
    "Borrower Name",
    "Book Number",
    "Vesting Type",
    "Record Type Code",
    "Lender Name",
    "Loan Type",
    "Borrower ID",
];

pub const DISTRESS_TITLES: &[&str] = &[
    "Document #",
    "Current Beneficiary",
    "Original Loan Amount",
    "Contact Name",
    "Page #",
    "Source",
    "Minimum Bid Amount",
    "Telephone #",
    "Contract Date",
    "Attention To",
    "Past Due Amount",
    "As Of Date",
    "Recording Date",
    "Unpaid Balance",
    "Case #",
    "Auction City",
    "Original Beneficiary Code",
    "Loan Recording Date",
    "Auction Location",
    "Original Beneficiary Lender",
    "Auction Time",
    "Contact Address",
    "Auction Date",
    "Document Type Code",
];
